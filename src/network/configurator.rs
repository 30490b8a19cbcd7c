//! Installs a lease on an interface with `ip(8)`.

use super::interface::{link_up, run_ip};
use crate::{error::LeaseholdError, lease::InterfaceConfig};

pub struct NetworkConfigurator {
    interface: String,
}

impl NetworkConfigurator {
    pub fn new(interface: String) -> Self {
        Self { interface }
    }

    /// Replaces any existing addressing with `config` and, when a gateway
    /// is known, points the default route at it.
    pub async fn apply(&self, config: &InterfaceConfig) -> Result<(), LeaseholdError> {
        let dev = self.interface.as_str();

        if let Err(e) = run_ip(&["addr", "flush", "dev", dev]).await {
            tracing::debug!("Flushing addresses on {} failed: {}", dev, e);
        }
        link_up(dev).await?;

        let cidr = config.cidr();
        run_ip(&["addr", "add", &cidr, "dev", dev]).await?;
        tracing::info!("Assigned {} to {}", cidr, dev);

        if let Some(gateway) = config.gateway {
            let gateway = gateway.to_string();
            run_ip(&["route", "replace", "default", "via", &gateway, "dev", dev]).await?;
            tracing::info!("Default route via {} on {}", gateway, dev);
        }
        Ok(())
    }
}
