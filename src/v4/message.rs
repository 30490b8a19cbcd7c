//! DHCPv4 packet codec.
//!
//! Outgoing messages are always BOOTREQUESTs with the broadcast flag set.
//! Incoming messages are validated against the fixed BOOTP header and the
//! transaction they are expected to belong to before their options are
//! looked at.

use super::{
    mac::MacAddress,
    options::{self, MessageType, OptionMap},
};
use bytes::{Buf as _, BufMut as _, Bytes, BytesMut};
use std::net::Ipv4Addr;
use thiserror::Error;

pub const BOOTREQUEST: u8 = 1;
pub const BOOTREPLY: u8 = 2;
pub const HTYPE_ETHERNET: u8 = 1;
pub const MAGIC_COOKIE: u32 = 0x6382_5363;

/// BOOTP fixed header plus the magic cookie.
pub const HEADER_LEN: usize = 240;

const FLAG_BROADCAST: u16 = 0x8000;
const COOKIE_OFFSET: usize = 236;
/// Advertised in option 57. The minimum every host must accept.
const MAX_MESSAGE_SIZE: u16 = 576;
const REQUESTED_PARAMETERS: [u8; 4] = [
    options::SUBNET_MASK,
    options::ROUTER,
    options::DOMAIN_NAME_SERVER,
    options::ADDRESS_LEASE_TIME,
];

/// Why an incoming datagram was not accepted as a reply to our transaction.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("packet too short: {0} bytes")]
    TooShort(usize),

    #[error("not a BOOTREPLY (op {0})")]
    NotReply(u8),

    #[error("unsupported hardware type {htype} / length {hlen}")]
    NotEthernet { htype: u8, hlen: u8 },

    #[error("transaction id {got:#010x} does not match {expected:#010x}")]
    XidMismatch { expected: u32, got: u32 },

    #[error("bad magic cookie {0:#010x}")]
    BadCookie(u32),
}

/// A decoded DHCP reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub op: u8,
    pub htype: u8,
    pub hlen: u8,
    pub xid: u32,
    pub flags: u16,
    pub ciaddr: Ipv4Addr,
    pub yiaddr: Ipv4Addr,
    pub siaddr: Ipv4Addr,
    pub chaddr: MacAddress,
    pub options: OptionMap,
}

impl Packet {
    pub fn message_type(&self) -> Option<MessageType> {
        self.options.message_type()
    }
}

/// Best-effort host name for option 12.
#[cfg(unix)]
pub fn local_hostname() -> Option<String> {
    let mut buf = [0u8; 256];
    // SAFETY: the pointer and length describe a writable buffer we own.
    let ret = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
    if ret != 0 {
        return None;
    }
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    let name = String::from_utf8_lossy(&buf[..len]).into_owned();
    (!name.is_empty()).then_some(name)
}

#[cfg(not(unix))]
pub fn local_hostname() -> Option<String> {
    None
}

fn put_option(buf: &mut BytesMut, code: u8, value: &[u8]) {
    let value = &value[..value.len().min(255)];
    buf.put_u8(code);
    buf.put_u8(value.len() as u8);
    buf.put_slice(value);
}

/// Encodes one client message.
///
/// Options are written as: message type, client identifier, host name (if
/// any), maximum message size, parameter request list, requested address
/// (if any), server identifier (if any), end.
pub fn encode(
    message_type: MessageType,
    mac: &MacAddress,
    xid: u32,
    requested_ip: Option<Ipv4Addr>,
    server_id: Option<Ipv4Addr>,
    hostname: Option<&str>,
) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + 64);

    buf.put_u8(BOOTREQUEST);
    buf.put_u8(HTYPE_ETHERNET);
    buf.put_u8(MacAddress::LEN as u8);
    buf.put_u8(0); // hops
    buf.put_u32(xid);
    buf.put_u16(0); // secs
    buf.put_u16(FLAG_BROADCAST);
    buf.put_bytes(0, 16); // ciaddr, yiaddr, siaddr, giaddr
    buf.put_slice(mac.as_bytes());
    buf.put_bytes(0, 16 - MacAddress::LEN + 64 + 128); // chaddr padding, sname, file
    buf.put_u32(MAGIC_COOKIE);
    debug_assert_eq!(buf.len(), HEADER_LEN);

    put_option(&mut buf, options::MESSAGE_TYPE, &[message_type.to_u8()]);

    let mut client_id = Vec::with_capacity(1 + MacAddress::LEN);
    client_id.push(HTYPE_ETHERNET);
    client_id.extend_from_slice(mac.as_bytes());
    put_option(&mut buf, options::CLIENT_IDENTIFIER, &client_id);

    if let Some(name) = hostname.filter(|name| !name.is_empty()) {
        put_option(&mut buf, options::HOST_NAME, name.as_bytes());
    }

    put_option(
        &mut buf,
        options::MAX_MESSAGE_SIZE,
        &MAX_MESSAGE_SIZE.to_be_bytes(),
    );
    put_option(
        &mut buf,
        options::PARAMETER_REQUEST_LIST,
        &REQUESTED_PARAMETERS,
    );

    if let Some(ip) = requested_ip {
        put_option(&mut buf, options::REQUESTED_IP_ADDRESS, &ip.octets());
    }
    if let Some(ip) = server_id {
        put_option(&mut buf, options::SERVER_IDENTIFIER, &ip.octets());
    }

    buf.put_u8(options::END);
    buf.freeze()
}

/// Constructs a DHCP Discover message.
pub fn build_dhcp_discover(mac: &MacAddress, xid: u32, hostname: Option<&str>) -> Bytes {
    encode(MessageType::Discover, mac, xid, None, None, hostname)
}

/// Constructs a DHCP Request for an offered address.
pub fn build_dhcp_request(
    mac: &MacAddress,
    xid: u32,
    offered_ip: Ipv4Addr,
    server_ip: Ipv4Addr,
    hostname: Option<&str>,
) -> Bytes {
    encode(
        MessageType::Request,
        mac,
        xid,
        Some(offered_ip),
        Some(server_ip),
        hostname,
    )
}

fn read_ipv4(buf: &mut &[u8]) -> Ipv4Addr {
    Ipv4Addr::from(buf.get_u32())
}

/// Decodes a server reply belonging to transaction `expected_xid`.
pub fn decode(data: &[u8], expected_xid: u32) -> Result<Packet, DecodeError> {
    if data.len() < HEADER_LEN {
        return Err(DecodeError::TooShort(data.len()));
    }

    let mut header = &data[..COOKIE_OFFSET];
    let op = header.get_u8();
    let htype = header.get_u8();
    let hlen = header.get_u8();
    let _hops = header.get_u8();
    let xid = header.get_u32();

    if op != BOOTREPLY {
        return Err(DecodeError::NotReply(op));
    }
    if htype != HTYPE_ETHERNET || hlen as usize != MacAddress::LEN {
        return Err(DecodeError::NotEthernet { htype, hlen });
    }
    if xid != expected_xid {
        return Err(DecodeError::XidMismatch {
            expected: expected_xid,
            got: xid,
        });
    }

    let cookie = (&data[COOKIE_OFFSET..HEADER_LEN]).get_u32();
    if cookie != MAGIC_COOKIE {
        return Err(DecodeError::BadCookie(cookie));
    }

    let _secs = header.get_u16();
    let flags = header.get_u16();
    let ciaddr = read_ipv4(&mut header);
    let yiaddr = read_ipv4(&mut header);
    let siaddr = read_ipv4(&mut header);
    let _giaddr = read_ipv4(&mut header);
    let mut chaddr = [0u8; MacAddress::LEN];
    header.copy_to_slice(&mut chaddr);

    Ok(Packet {
        op,
        htype,
        hlen,
        xid,
        flags,
        ciaddr,
        yiaddr,
        siaddr,
        chaddr: MacAddress::new(chaddr),
        options: OptionMap::parse(&data[HEADER_LEN..]),
    })
}
