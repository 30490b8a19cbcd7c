//! Turning an acknowledged lease into interface configuration.

use crate::{error::LeaseholdError, v4::Packet};
use std::net::Ipv4Addr;

/// Prefix used when the server sends no usable subnet mask.
pub const DEFAULT_PREFIX_LEN: u8 = 24;

/// Addressing derived from a DHCP ACK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceConfig {
    pub address: Ipv4Addr,
    pub prefix_len: u8,
    pub gateway: Option<Ipv4Addr>,
    pub dns_servers: Vec<Ipv4Addr>,
}

impl InterfaceConfig {
    /// `address/prefix` notation.
    pub fn cidr(&self) -> String {
        format!("{}/{}", self.address, self.prefix_len)
    }
}

/// Builds the interface configuration from an ACK.
///
/// Only a missing address is an error; absent or malformed optional fields
/// just leave their part of the configuration empty.
pub fn translate(ack: &Packet) -> Result<InterfaceConfig, LeaseholdError> {
    if ack.yiaddr.is_unspecified() {
        return Err(LeaseholdError::NoAddress);
    }

    let opts = &ack.options;
    if let Some(lease_time) = opts.lease_time() {
        tracing::debug!("Lease for {} valid for {:?}", ack.yiaddr, lease_time);
    }

    Ok(InterfaceConfig {
        address: ack.yiaddr,
        prefix_len: opts.prefix_len().unwrap_or(DEFAULT_PREFIX_LEN),
        gateway: opts.router(),
        dns_servers: opts.dns_servers(),
    })
}
