use async_trait::async_trait;
use leasehold::{
    runner::negotiate,
    v4::{options, MessageType, OptionMap},
    ClientConfig, InterfaceConfig, LeaseholdError, MacAddress, Transport,
};
use std::{
    collections::VecDeque,
    io,
    net::{Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio_test::assert_ok;

const MAC: MacAddress = MacAddress::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
const XID: u32 = 0x1234_5678;
const OFFERED: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 50);
const SERVER: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 1);

fn reply(message_type: MessageType, xid: u32, yiaddr: Ipv4Addr, opts: &[(u8, &[u8])]) -> Vec<u8> {
    let mut out = vec![0u8; 240];
    out[0] = 2;
    out[1] = 1;
    out[2] = 6;
    out[4..8].copy_from_slice(&xid.to_be_bytes());
    out[16..20].copy_from_slice(&yiaddr.octets());
    out[28..34].copy_from_slice(MAC.as_bytes());
    out[236..240].copy_from_slice(&[0x63, 0x82, 0x53, 0x63]);
    out.extend_from_slice(&[options::MESSAGE_TYPE, 1, message_type.to_u8()]);
    for (code, value) in opts {
        out.push(*code);
        out.push(value.len() as u8);
        out.extend_from_slice(value);
    }
    out.push(options::END);
    out
}

/// Answers Discover with an Offer and Request with an Ack, recording what
/// the client sent.
#[derive(Clone, Default)]
struct FakeServer {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    pending: Arc<Mutex<VecDeque<Vec<u8>>>>,
}

impl FakeServer {
    fn sent(&self) -> Vec<(MessageType, OptionMap)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|bytes| {
                let opts = OptionMap::parse(&bytes[240..]);
                (opts.message_type().unwrap(), opts)
            })
            .collect()
    }
}

#[async_trait]
impl Transport for FakeServer {
    async fn send(&mut self, packet: &[u8], target: SocketAddr) -> io::Result<usize> {
        assert_eq!(target, SocketAddr::from((Ipv4Addr::BROADCAST, 67)));
        self.sent.lock().unwrap().push(packet.to_vec());

        let xid = u32::from_be_bytes([packet[4], packet[5], packet[6], packet[7]]);
        let opts = OptionMap::parse(&packet[240..]);
        let answer = match opts.message_type() {
            Some(MessageType::Discover) => Some(reply(
                MessageType::Offer,
                xid,
                OFFERED,
                &[(options::SERVER_IDENTIFIER, &SERVER.octets()[..])],
            )),
            Some(MessageType::Request) => Some(reply(
                MessageType::Ack,
                xid,
                OFFERED,
                &[
                    (options::SUBNET_MASK, &[255, 255, 255, 0][..]),
                    (options::ROUTER, &SERVER.octets()[..]),
                    (options::DOMAIN_NAME_SERVER, &[192, 0, 2, 2][..]),
                    (options::ADDRESS_LEASE_TIME, &3600u32.to_be_bytes()[..]),
                    (options::SERVER_IDENTIFIER, &SERVER.octets()[..]),
                ],
            )),
            _ => None,
        };
        if let Some(answer) = answer {
            self.pending.lock().unwrap().push_back(answer);
        }
        Ok(packet.len())
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let next = self.pending.lock().unwrap().pop_front();
        match next {
            Some(datagram) => {
                buf[..datagram.len()].copy_from_slice(&datagram);
                Ok(datagram.len())
            }
            None => std::future::pending().await,
        }
    }
}

fn config() -> ClientConfig {
    ClientConfig::new("eth0".to_string(), MAC).with_timeout(Duration::from_secs(5))
}

#[tokio::test(start_paused = true)]
async fn test_end_to_end_lease() {
    let server = FakeServer::default();

    let lease = assert_ok!(negotiate(config(), server.clone(), XID).await);

    assert_eq!(
        lease,
        InterfaceConfig {
            address: OFFERED,
            prefix_len: 24,
            gateway: Some(SERVER),
            dns_servers: vec![Ipv4Addr::new(192, 0, 2, 2)],
        }
    );

    let sent = server.sent();
    assert_eq!(sent.len(), 2);
    let (discover_type, discover) = &sent[0];
    assert_eq!(*discover_type, MessageType::Discover);
    assert_eq!(
        discover.get(options::CLIENT_IDENTIFIER),
        Some(&[1, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF][..])
    );

    let (request_type, request) = &sent[1];
    assert_eq!(*request_type, MessageType::Request);
    assert_eq!(request.ipv4(options::REQUESTED_IP_ADDRESS), Some(OFFERED));
    assert_eq!(request.ipv4(options::SERVER_IDENTIFIER), Some(SERVER));
}

#[tokio::test(start_paused = true)]
async fn test_every_message_carries_the_transaction_id() {
    let server = FakeServer::default();
    assert_ok!(negotiate(config(), server.clone(), XID).await);

    for bytes in server.sent.lock().unwrap().iter() {
        assert_eq!(&bytes[4..8], &XID.to_be_bytes());
    }
}

/// A server that only ever answers other clients.
struct BusyNetwork;

#[async_trait]
impl Transport for BusyNetwork {
    async fn send(&mut self, packet: &[u8], _target: SocketAddr) -> io::Result<usize> {
        Ok(packet.len())
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let datagram = reply(
            MessageType::Offer,
            XID ^ 0xffff_ffff,
            OFFERED,
            &[(options::SERVER_IDENTIFIER, &SERVER.octets()[..])],
        );
        buf[..datagram.len()].copy_from_slice(&datagram);
        Ok(datagram.len())
    }
}

#[tokio::test(start_paused = true)]
async fn test_foreign_traffic_runs_into_deadline() {
    let started = tokio::time::Instant::now();
    let result = negotiate(config(), BusyNetwork, XID).await;

    assert!(started.elapsed() >= Duration::from_secs(5));
    assert!(matches!(result, Err(LeaseholdError::Timeout { .. })));
}

#[test]
fn test_config_creation() {
    let config = ClientConfig::new("eth0".to_string(), MAC);

    assert_eq!(config.interface, "eth0");
    assert_eq!(config.mac_address, MAC);
    assert_eq!(config.client_port, 68);
    assert_eq!(config.server_port, 67);
    assert_eq!(config.timeout, Duration::from_secs(10));
    assert_eq!(config.read_timeout, Duration::from_millis(750));
}
