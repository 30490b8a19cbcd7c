use crate::network::SocketError;
use std::{fmt, io, time::Duration};
use thiserror::Error;

/// The negotiation step a timeout happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Offer,
    Ack,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Offer => f.write_str("DHCP OFFER"),
            Phase::Ack => f.write_str("DHCP ACK"),
        }
    }
}

#[derive(Error, Debug)]
pub enum LeaseholdError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Socket operation failed")]
    Socket(#[from] SocketError),

    #[error("I/O error")]
    Io(#[from] io::Error),

    #[error("Failed to parse MAC address: {0}")]
    MacParse(String),

    #[error("Interface '{0}' not found or has no MAC address")]
    InterfaceInvalid(String),

    #[error("Interface '{interface}' has an unsupported {len}-byte hardware address")]
    UnsupportedHardwareAddress { interface: String, len: usize },

    #[error("Timed out waiting for {phase} after {waited:?}")]
    Timeout { phase: Phase, waited: Duration },

    #[error("No address in DHCP ACK")]
    NoAddress,

    #[error("No suitable interfaces found")]
    NoInterfaces,

    #[error("{interface}")]
    OnInterface {
        interface: String,
        #[source]
        source: Box<LeaseholdError>,
    },

    #[error("Command `{command}` failed with {status}")]
    Command {
        command: String,
        status: std::process::ExitStatus,
    },

    #[error("State machine reached a critical failure: {0}")]
    Critical(String),
}

impl LeaseholdError {
    /// The error and its sources joined with `: `.
    pub fn report(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str(": ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }

    pub fn on_interface(interface: impl Into<String>, source: LeaseholdError) -> Self {
        Self::OnInterface {
            interface: interface.into(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_includes_sources() {
        let err = LeaseholdError::on_interface(
            "eth0",
            LeaseholdError::Socket(SocketError::BindSocket {
                port: 68,
                source: io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
            }),
        );
        assert_eq!(
            err.report(),
            "eth0: Socket operation failed: Failed to bind socket to port 68: address in use"
        );
    }

    #[test]
    fn test_timeout_is_phase_labelled() {
        let err = LeaseholdError::Timeout {
            phase: Phase::Offer,
            waited: Duration::from_secs(10),
        };
        assert_eq!(err.to_string(), "Timed out waiting for DHCP OFFER after 10s");
    }
}
