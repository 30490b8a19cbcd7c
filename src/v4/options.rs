//! DHCP option codes and the decoded option table.
//!
//! Options arrive as a `(code, length, value)` stream after the magic
//! cookie. The table keeps the raw value of the first occurrence of each
//! code; the typed readers below interpret those bytes without ever
//! inventing data that was not on the wire.

use bytes::Bytes;
use std::{collections::HashMap, net::Ipv4Addr, time::Duration};

pub const PAD: u8 = 0;
pub const SUBNET_MASK: u8 = 1;
pub const ROUTER: u8 = 3;
pub const DOMAIN_NAME_SERVER: u8 = 6;
pub const HOST_NAME: u8 = 12;
pub const REQUESTED_IP_ADDRESS: u8 = 50;
pub const ADDRESS_LEASE_TIME: u8 = 51;
pub const MESSAGE_TYPE: u8 = 53;
pub const SERVER_IDENTIFIER: u8 = 54;
pub const PARAMETER_REQUEST_LIST: u8 = 55;
pub const MAX_MESSAGE_SIZE: u8 = 57;
pub const CLIENT_IDENTIFIER: u8 = 61;
pub const END: u8 = 255;

/// DHCP message types (option 53).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    Discover = 1,
    Offer = 2,
    Request = 3,
    Decline = 4,
    Ack = 5,
    Nak = 6,
    Release = 7,
    Inform = 8,
}

impl MessageType {
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Discover),
            2 => Some(Self::Offer),
            3 => Some(Self::Request),
            4 => Some(Self::Decline),
            5 => Some(Self::Ack),
            6 => Some(Self::Nak),
            7 => Some(Self::Release),
            8 => Some(Self::Inform),
            _ => None,
        }
    }
}

/// Raw option values keyed by code. First occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionMap {
    entries: HashMap<u8, Bytes>,
}

impl OptionMap {
    /// Scans an option stream.
    ///
    /// Stops at an END marker or when the buffer runs out. An option whose
    /// declared length runs past the buffer halts the scan; whatever was
    /// collected up to that point is kept.
    pub fn parse(data: &[u8]) -> Self {
        let mut entries = HashMap::new();
        let mut i = 0;
        while i < data.len() {
            let code = data[i];
            i += 1;
            match code {
                PAD => continue,
                END => break,
                _ => {
                    let Some(&len) = data.get(i) else { break };
                    i += 1;
                    let end = i + len as usize;
                    if end > data.len() {
                        break;
                    }
                    entries
                        .entry(code)
                        .or_insert_with(|| Bytes::copy_from_slice(&data[i..end]));
                    i = end;
                }
            }
        }
        Self { entries }
    }

    pub fn get(&self, code: u8) -> Option<&[u8]> {
        self.entries.get(&code).map(|v| v.as_ref())
    }

    pub fn contains(&self, code: u8) -> bool {
        self.entries.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A single IPv4 address. Anything but exactly four bytes is absent.
    pub fn ipv4(&self, code: u8) -> Option<Ipv4Addr> {
        let octets: [u8; 4] = self.get(code)?.try_into().ok()?;
        Some(Ipv4Addr::from(octets))
    }

    /// Every complete 4-byte group of a list option; a trailing partial group is ignored.
    pub fn ipv4_list(&self, code: u8) -> Vec<Ipv4Addr> {
        self.get(code)
            .map(|value| {
                value
                    .chunks_exact(4)
                    .map(|c| Ipv4Addr::new(c[0], c[1], c[2], c[3]))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn u32(&self, code: u8) -> Option<u32> {
        let raw: [u8; 4] = self.get(code)?.try_into().ok()?;
        Some(u32::from_be_bytes(raw))
    }

    pub fn message_type(&self) -> Option<MessageType> {
        match self.get(MESSAGE_TYPE)? {
            [value] => MessageType::from_u8(*value),
            _ => None,
        }
    }

    pub fn subnet_mask(&self) -> Option<Ipv4Addr> {
        self.ipv4(SUBNET_MASK)
    }

    /// Prefix length derived from the subnet mask, when the mask is present and contiguous.
    pub fn prefix_len(&self) -> Option<u8> {
        self.subnet_mask().and_then(prefix_from_mask)
    }

    /// The first router listed in option 3.
    pub fn router(&self) -> Option<Ipv4Addr> {
        self.ipv4_list(ROUTER).into_iter().next()
    }

    pub fn dns_servers(&self) -> Vec<Ipv4Addr> {
        self.ipv4_list(DOMAIN_NAME_SERVER)
    }

    pub fn server_identifier(&self) -> Option<Ipv4Addr> {
        self.ipv4(SERVER_IDENTIFIER)
    }

    pub fn lease_time(&self) -> Option<Duration> {
        self.u32(ADDRESS_LEASE_TIME)
            .map(|secs| Duration::from_secs(u64::from(secs)))
    }
}

/// Counts the leading one-bits of a mask. Non-contiguous masks yield `None`.
pub fn prefix_from_mask(mask: Ipv4Addr) -> Option<u8> {
    let bits = u32::from(mask);
    let ones = bits.leading_ones();
    if bits.checked_shl(ones).unwrap_or(0) != 0 {
        return None;
    }
    u8::try_from(ones).ok()
}
