use std::{net::Ipv4Addr, path::Path};
use tokio::{fs, io};

const HEADER: &str = "# Generated by leasehold\n";

/// Renders resolver configuration: a header comment, then one
/// `nameserver` line per address.
pub fn render(servers: &[Ipv4Addr]) -> String {
    let mut out = String::from(HEADER);
    for server in servers {
        out.push_str("nameserver ");
        out.push_str(&server.to_string());
        out.push('\n');
    }
    out
}

/// Overwrites `path` with `servers`, creating the parent directory if needed.
pub async fn write_resolv_conf(path: &Path, servers: &[Ipv4Addr]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, render(servers)).await
}
