//! Interface lookups backed by sysfs, plus link control through `ip(8)`.

use crate::{error::LeaseholdError, v4::MacAddress};
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::{fs, process::Command};

const SYSFS_NET: &str = "/sys/class/net";

/// Runs `ip` with the given arguments, discarding its output.
pub(crate) async fn run_ip(args: &[&str]) -> Result<(), LeaseholdError> {
    let status = Command::new("ip")
        .args(args)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await?;
    if status.success() {
        Ok(())
    } else {
        Err(LeaseholdError::Command {
            command: format!("ip {}", args.join(" ")),
            status,
        })
    }
}

pub async fn link_up(interface: &str) -> Result<(), LeaseholdError> {
    run_ip(&["link", "set", "dev", interface, "up"]).await
}

/// Reads the hardware address of `interface`. Anything but a 6-byte
/// Ethernet address is rejected.
pub async fn hardware_address(interface: &str) -> Result<MacAddress, LeaseholdError> {
    hardware_address_in(Path::new(SYSFS_NET), interface).await
}

async fn hardware_address_in(root: &Path, interface: &str) -> Result<MacAddress, LeaseholdError> {
    let path = root.join(interface).join("address");
    let text = match fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(LeaseholdError::InterfaceInvalid(interface.to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    let octets = MacAddress::parse_octets(&text)
        .map_err(|e| LeaseholdError::MacParse(format!("{}: {e}", text.trim())))?;
    MacAddress::from_slice(&octets).ok_or_else(|| LeaseholdError::UnsupportedHardwareAddress {
        interface: interface.to_string(),
        len: octets.len(),
    })
}

async fn is_loopback(dir: &Path) -> bool {
    let Ok(flags) = fs::read_to_string(dir.join("flags")).await else {
        return false;
    };
    let flags = flags.trim().trim_start_matches("0x");
    u32::from_str_radix(flags, 16)
        .map(|f| f & libc::IFF_LOOPBACK as u32 != 0)
        .unwrap_or(false)
}

/// Interfaces worth negotiating on: not loopback, with a plausible 6-byte
/// hardware address. Sorted by name.
pub async fn candidate_interfaces() -> Result<Vec<String>, LeaseholdError> {
    candidate_interfaces_in(Path::new(SYSFS_NET)).await
}

async fn candidate_interfaces_in(root: &Path) -> Result<Vec<String>, LeaseholdError> {
    let mut entries = fs::read_dir(root).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let dir: PathBuf = entry.path();
        if name == "lo" || is_loopback(&dir).await {
            tracing::debug!("Skipping loopback interface {}", name);
            continue;
        }
        match hardware_address_in(root, &name).await {
            Ok(mac) if mac.is_plausible() => names.push(name),
            Ok(mac) => tracing::debug!("Skipping {}: implausible address {}", name, mac),
            Err(e) => tracing::debug!("Skipping {}: {}", name, e),
        }
    }
    names.sort();
    Ok(names)
}
