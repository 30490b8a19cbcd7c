//! DHCPv4 lease negotiation state machine
//!
//! Drives Discover → Offer → Request → Ack for a single transaction. Each
//! phase sends exactly one message; everything after that is waiting for a
//! matching reply until the caller reports that the deadline has passed.

use super::{
    mac::MacAddress,
    message::{build_dhcp_discover, build_dhcp_request, decode, Packet},
    options::MessageType,
};
use crate::{
    client::{Action, DhcpStateMachine, Event},
    error::{LeaseholdError, Phase},
};
use std::net::{Ipv4Addr, SocketAddr};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum DhcpV4State {
    Idle,
    AwaitingOffer,
    AwaitingAck,
    Done,
    Failed,
}

/// Offer fields carried into the Request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferCandidate {
    pub offered_ip: Ipv4Addr,
    pub server_identifier: Ipv4Addr,
}

pub struct DhcpV4Handler {
    state: DhcpV4State,
    mac_address: MacAddress,
    xid: u32,
    server: SocketAddr,
    hostname: Option<String>,
    offer: Option<OfferCandidate>,
}

impl DhcpV4Handler {
    pub fn new(mac_address: MacAddress, xid: u32, server: SocketAddr) -> Self {
        Self {
            state: DhcpV4State::Idle,
            mac_address,
            xid,
            server,
            hostname: None,
            offer: None,
        }
    }

    pub fn with_hostname(mut self, hostname: Option<String>) -> Self {
        self.hostname = hostname;
        self
    }

    pub fn xid(&self) -> u32 {
        self.xid
    }

    pub fn offer(&self) -> Option<OfferCandidate> {
        self.offer
    }

    /// Decodes a datagram and keeps it only if it is the message type we
    /// are waiting for in this transaction.
    fn accept(&self, data: &[u8], wanted: MessageType) -> Option<Packet> {
        let packet = match decode(data, self.xid) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::debug!("Dropping packet ({} bytes): {}", data.len(), e);
                return None;
            }
        };

        match packet.message_type() {
            Some(mt) if mt == wanted => Some(packet),
            Some(MessageType::Nak) => {
                tracing::debug!(
                    "Ignoring DHCP NAK from {:?} while waiting for {:?}",
                    packet.options.server_identifier(),
                    wanted
                );
                None
            }
            other => {
                tracing::debug!("Not a DHCP {:?} message: {:?}", wanted, other);
                None
            }
        }
    }

    fn handle_idle(&mut self) -> Result<Action, LeaseholdError> {
        let discover = build_dhcp_discover(&self.mac_address, self.xid, self.hostname.as_deref());
        self.state = DhcpV4State::AwaitingOffer;
        tracing::debug!("Broadcasting DHCP DISCOVER, XID={:#010x}", self.xid);
        Ok(Action::Send(discover, self.server))
    }

    fn handle_awaiting_offer(&mut self, event: Event) -> Result<Action, LeaseholdError> {
        match event {
            Event::PacketReceived(data) => {
                let Some(offer) = self.accept(data, MessageType::Offer) else {
                    return Ok(Action::Wait);
                };
                let Some(server_identifier) = offer.options.server_identifier() else {
                    tracing::debug!("DHCP OFFER for {} lacks a server identifier", offer.yiaddr);
                    return Ok(Action::Wait);
                };

                tracing::info!(
                    "Received DHCP OFFER for {} from server {}",
                    offer.yiaddr,
                    server_identifier
                );
                let candidate = OfferCandidate {
                    offered_ip: offer.yiaddr,
                    server_identifier,
                };
                self.offer = Some(candidate);
                self.state = DhcpV4State::AwaitingAck;

                let request = build_dhcp_request(
                    &self.mac_address,
                    self.xid,
                    candidate.offered_ip,
                    candidate.server_identifier,
                    self.hostname.as_deref(),
                );
                Ok(Action::Send(request, self.server))
            }
            Event::DeadlineExpired(waited) => self.fail(Phase::Offer, waited),
            Event::Start => Err(self.misuse("start")),
        }
    }

    fn handle_awaiting_ack(&mut self, event: Event) -> Result<Action, LeaseholdError> {
        match event {
            Event::PacketReceived(data) => match self.accept(data, MessageType::Ack) {
                Some(ack) => {
                    tracing::info!("Received DHCP ACK for {}", ack.yiaddr);
                    self.state = DhcpV4State::Done;
                    Ok(Action::Bound(ack))
                }
                None => Ok(Action::Wait),
            },
            Event::DeadlineExpired(waited) => self.fail(Phase::Ack, waited),
            Event::Start => Err(self.misuse("start")),
        }
    }

    fn fail(
        &mut self,
        phase: Phase,
        waited: std::time::Duration,
    ) -> Result<Action, LeaseholdError> {
        tracing::warn!("Deadline reached in {} state", self.state_name());
        self.state = DhcpV4State::Failed;
        Err(LeaseholdError::Timeout { phase, waited })
    }

    fn misuse(&self, what: &str) -> LeaseholdError {
        LeaseholdError::Critical(format!("unexpected {what} event in {} state", self.state_name()))
    }
}

impl DhcpStateMachine for DhcpV4Handler {
    fn state_name(&self) -> &'static str {
        match self.state {
            DhcpV4State::Idle => "Idle",
            DhcpV4State::AwaitingOffer => "AwaitingOffer",
            DhcpV4State::AwaitingAck => "AwaitingAck",
            DhcpV4State::Done => "Done",
            DhcpV4State::Failed => "Failed",
        }
    }

    fn handle_event(&mut self, event: Event) -> Result<Action, LeaseholdError> {
        tracing::trace!("Handling event {:?} in state {:?}", event, self.state);
        match self.state {
            DhcpV4State::Idle => match event {
                Event::Start => self.handle_idle(),
                _ => Err(self.misuse("non-start")),
            },
            DhcpV4State::AwaitingOffer => self.handle_awaiting_offer(event),
            DhcpV4State::AwaitingAck => self.handle_awaiting_ack(event),
            DhcpV4State::Done => Ok(Action::Exit),
            DhcpV4State::Failed => Err(self.misuse("post-failure")),
        }
    }
}
