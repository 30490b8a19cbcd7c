//! DHCP client implementation
//!
//! This module contains the negotiation driver:
//! - The state machine contract (events in, actions out)
//! - Sending and receiving through a [`Transport`]
//! - The overall deadline and the rolling read timeout

use crate::{
    config::ClientConfig,
    error::LeaseholdError,
    network::Transport,
    v4::{handler::DhcpV4Handler, message::local_hostname, Packet},
};
use bytes::Bytes;
use std::{io, net::SocketAddr, time::Duration};
use tokio::time::{self, Instant};

/// Largest datagram we accept.
const RECV_BUFFER_LEN: usize = 1500;

/// Actions the state machine asks the driver to perform
#[derive(Debug)]
pub enum Action {
    Send(Bytes, SocketAddr),
    Wait,
    Bound(Packet),
    Exit,
}

/// External events the state machine reacts to
#[derive(Debug)]
pub enum Event<'a> {
    Start,
    PacketReceived(&'a [u8]),
    /// The overall deadline passed; carries how long the negotiation ran.
    DeadlineExpired(Duration),
}

/// Common contract for DHCP state machines
pub trait DhcpStateMachine {
    /// Handles one event and returns the next action to perform
    fn handle_event(&mut self, event: Event) -> Result<Action, LeaseholdError>;
    /// Current state name, for logging
    fn state_name(&self) -> &'static str;
}

pub struct DhcpClient<T: Transport> {
    config: ClientConfig,
    transport: T,
    state_machine: Box<dyn DhcpStateMachine + Send>,
}

impl<T: Transport> DhcpClient<T> {
    /// Prepares a negotiation for transaction `xid` over `transport`.
    pub fn new(config: ClientConfig, transport: T, xid: u32) -> Self {
        let handler = DhcpV4Handler::new(config.mac_address, xid, config.server_addr())
            .with_hostname(local_hostname());
        Self::with_state_machine(config, transport, Box::new(handler))
    }

    pub fn with_state_machine(
        config: ClientConfig,
        transport: T,
        state_machine: Box<dyn DhcpStateMachine + Send>,
    ) -> Self {
        Self {
            config,
            transport,
            state_machine,
        }
    }

    pub fn state_name(&self) -> &'static str {
        self.state_machine.state_name()
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Reads until a datagram arrives or `deadline` passes.
    ///
    /// Each read is bounded by the configured read timeout so the deadline
    /// is re-checked regularly.
    async fn wait_for_response(
        &mut self,
        started: Instant,
        deadline: Instant,
    ) -> Result<Action, LeaseholdError> {
        let mut buf = [0u8; RECV_BUFFER_LEN];
        loop {
            let now = Instant::now();
            if now >= deadline {
                return self
                    .state_machine
                    .handle_event(Event::DeadlineExpired(now - started));
            }

            let slice = self.config.read_timeout.min(deadline - now);
            match time::timeout(slice, self.transport.recv(&mut buf)).await {
                Ok(Ok(len)) => {
                    return self
                        .state_machine
                        .handle_event(Event::PacketReceived(&buf[..len]));
                }
                Ok(Err(e)) if is_transient(&e) => {
                    tracing::debug!("Transient receive error: {}", e);
                }
                Ok(Err(e)) => {
                    tracing::error!("Socket receive error: {}", e);
                    return Err(LeaseholdError::Io(e));
                }
                Err(_) => {}
            }
        }
    }

    /// Runs the negotiation to completion and returns the accepted ACK.
    pub async fn run(&mut self) -> Result<Packet, LeaseholdError> {
        let started = Instant::now();
        let deadline = started + self.config.timeout;
        let mut next_action = self.state_machine.handle_event(Event::Start)?;

        loop {
            tracing::debug!(
                "State: {}, Action: {:?}",
                self.state_machine.state_name(),
                next_action
            );

            match next_action {
                Action::Send(packet, addr) => {
                    self.transport.send(&packet, addr).await?;
                    tracing::info!(
                        "Sent {} bytes to {}, now {}",
                        packet.len(),
                        addr,
                        self.state_machine.state_name()
                    );
                    next_action = self.wait_for_response(started, deadline).await?;
                }
                Action::Wait => {
                    next_action = self.wait_for_response(started, deadline).await?;
                }
                Action::Bound(ack) => return Ok(ack),
                Action::Exit => {
                    return Err(LeaseholdError::Critical(
                        "State machine exited prematurely".to_string(),
                    ));
                }
            }
        }
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    )
}
