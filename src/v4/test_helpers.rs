//! Builders for server replies used across the unit tests.

use super::{
    mac::MacAddress,
    message::{BOOTREPLY, HEADER_LEN, HTYPE_ETHERNET, MAGIC_COOKIE},
    options::{self, MessageType, OptionMap},
};
use std::net::Ipv4Addr;

pub const TEST_MAC: MacAddress = MacAddress::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);

pub struct ReplyBuilder {
    op: u8,
    htype: u8,
    hlen: u8,
    xid: u32,
    yiaddr: Ipv4Addr,
    chaddr: MacAddress,
    cookie: u32,
    options: Vec<u8>,
}

impl ReplyBuilder {
    pub fn new(message_type: MessageType, xid: u32) -> Self {
        Self {
            op: BOOTREPLY,
            htype: HTYPE_ETHERNET,
            hlen: 6,
            xid,
            yiaddr: Ipv4Addr::UNSPECIFIED,
            chaddr: TEST_MAC,
            cookie: MAGIC_COOKIE,
            options: vec![options::MESSAGE_TYPE, 1, message_type.to_u8()],
        }
    }

    /// A reply with no message-type option at all.
    pub fn untyped(xid: u32) -> Self {
        let mut builder = Self::new(MessageType::Offer, xid);
        builder.options.clear();
        builder
    }

    pub fn op(mut self, op: u8) -> Self {
        self.op = op;
        self
    }

    pub fn hardware(mut self, htype: u8, hlen: u8) -> Self {
        self.htype = htype;
        self.hlen = hlen;
        self
    }

    pub fn cookie(mut self, cookie: u32) -> Self {
        self.cookie = cookie;
        self
    }

    pub fn yiaddr(mut self, addr: Ipv4Addr) -> Self {
        self.yiaddr = addr;
        self
    }

    pub fn option(mut self, code: u8, value: &[u8]) -> Self {
        self.options.push(code);
        self.options.push(value.len() as u8);
        self.options.extend_from_slice(value);
        self
    }

    pub fn ipv4(self, code: u8, addr: Ipv4Addr) -> Self {
        self.option(code, &addr.octets())
    }

    pub fn server_id(self, addr: Ipv4Addr) -> Self {
        self.ipv4(options::SERVER_IDENTIFIER, addr)
    }

    /// Appends bytes verbatim to the option stream.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.options.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = vec![0u8; HEADER_LEN];
        out[0] = self.op;
        out[1] = self.htype;
        out[2] = self.hlen;
        out[4..8].copy_from_slice(&self.xid.to_be_bytes());
        out[16..20].copy_from_slice(&self.yiaddr.octets());
        out[28..34].copy_from_slice(self.chaddr.as_bytes());
        out[236..240].copy_from_slice(&self.cookie.to_be_bytes());
        out.extend_from_slice(&self.options);
        out.push(options::END);
        out
    }
}

/// Splits a client message into its transaction id and options.
pub fn parse_request(bytes: &[u8]) -> (u32, OptionMap) {
    assert!(bytes.len() >= HEADER_LEN, "request shorter than header");
    let xid = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    (xid, OptionMap::parse(&bytes[HEADER_LEN..]))
}
