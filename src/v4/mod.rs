//! DHCPv4 protocol implementation
//!
//! This module contains the DHCPv4-specific implementation including:
//! - Hardware addresses
//! - Option table and typed option readers
//! - Message encoding and reply validation
//! - The lease negotiation state machine

pub mod handler;
pub mod mac;
pub mod message;
pub mod options;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use handler::{DhcpV4Handler, OfferCandidate};
pub use mac::MacAddress;
pub use message::{build_dhcp_discover, build_dhcp_request, decode, encode, DecodeError, Packet};
pub use options::{MessageType, OptionMap};
