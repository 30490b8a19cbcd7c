//! Per-interface lease acquisition and the all-interfaces loop.

use crate::{
    client::DhcpClient,
    config::{ClientConfig, Settings, Target},
    error::LeaseholdError,
    lease::{translate, InterfaceConfig},
    network::{
        configurator::NetworkConfigurator,
        interface::{candidate_interfaces, hardware_address, link_up},
        resolv::write_resolv_conf,
        Transport, UdpTransport,
    },
};
use std::{future::Future, time::Duration};

/// Acquires a lease on `interface` within `timeout`.
///
/// Brings the link up (best effort), resolves the hardware address, then
/// negotiates over a fresh socket that is closed before returning.
pub async fn run(interface: &str, timeout: Duration) -> Result<InterfaceConfig, LeaseholdError> {
    if let Err(e) = link_up(interface).await {
        tracing::warn!("{}: failed to set link up: {}", interface, e);
    }

    let mac = hardware_address(interface).await?;
    let xid: u32 = rand::random();
    let config = ClientConfig::new(interface.to_string(), mac).with_timeout(timeout);
    tracing::info!(
        "{}: negotiating as {} with XID={:#010x}",
        interface,
        mac,
        xid
    );

    let transport = UdpTransport::bind(interface, config.client_port)?;
    negotiate(config, transport, xid).await
}

/// Runs one negotiation over `transport` and translates the ACK.
///
/// The transport is consumed and dropped on every path out of here.
pub async fn negotiate<T: Transport>(
    config: ClientConfig,
    transport: T,
    xid: u32,
) -> Result<InterfaceConfig, LeaseholdError> {
    let mut client = DhcpClient::new(config, transport, xid);
    let ack = client.run().await?;
    translate(&ack)
}

/// Acquires a lease and installs it: address and route, resolver file,
/// and the summary line unless quiet.
pub async fn provision(
    interface: &str,
    settings: &Settings,
) -> Result<InterfaceConfig, LeaseholdError> {
    let config = run(interface, settings.timeout).await?;

    NetworkConfigurator::new(interface.to_string())
        .apply(&config)
        .await?;

    if let Some(path) = &settings.resolv_conf {
        if !config.dns_servers.is_empty() {
            if let Err(e) = write_resolv_conf(path, &config.dns_servers).await {
                tracing::warn!("{}: failed to write {}: {}", interface, path.display(), e);
            }
        }
    }

    if !settings.quiet {
        println!("{}", summary(interface, &config));
    }
    Ok(config)
}

/// `eth0: leased 192.0.2.50/24 gw 192.0.2.1`
pub fn summary(interface: &str, config: &InterfaceConfig) -> String {
    let mut line = format!("{}: leased {}", interface, config.cidr());
    if let Some(gateway) = config.gateway {
        line.push_str(&format!(" gw {gateway}"));
    }
    line
}

/// Calls `f` for every name in order, never stopping early. Returns the
/// first failure, labelled with its interface.
pub async fn for_each_interface<F, Fut, R>(names: &[String], mut f: F) -> Result<(), LeaseholdError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<R, LeaseholdError>>,
{
    let mut first_err = None;
    for name in names {
        if let Err(e) = f(name.clone()).await {
            tracing::error!("{}: {}", name, e);
            first_err.get_or_insert_with(|| LeaseholdError::on_interface(name.as_str(), e));
        }
    }
    first_err.map_or(Ok(()), Err)
}

pub async fn provision_all(settings: &Settings) -> Result<(), LeaseholdError> {
    let names = candidate_interfaces().await?;
    if names.is_empty() {
        return Err(LeaseholdError::NoInterfaces);
    }
    tracing::info!("Configuring interfaces: {}", names.join(", "));
    for_each_interface(&names, |name| async move { provision(&name, settings).await }).await
}

/// Entry point behind the command line.
pub async fn execute(settings: &Settings) -> Result<(), LeaseholdError> {
    match &settings.target {
        Target::All => provision_all(settings).await,
        Target::Interface(name) => provision(name, settings)
            .await
            .map(|_| ())
            .map_err(|e| LeaseholdError::on_interface(name.as_str(), e)),
    }
}
