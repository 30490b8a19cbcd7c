use crate::{error::LeaseholdError, v4::MacAddress};
use clap::Parser;
use std::{
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// The network interface to configure (e.g., 'eth0')
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Overall time allowed for each lease negotiation, in seconds
    #[arg(short, long, default_value_t = 10, allow_negative_numbers = true)]
    pub timeout: i64,

    /// Resolver file to write DNS servers to (empty disables)
    #[arg(long, default_value = "/etc/resolv.conf")]
    pub resolv_conf: String,

    /// Configure every non-loopback interface with an Ethernet address
    #[arg(long, conflicts_with = "interface")]
    pub all: bool,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// What to negotiate on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Interface(String),
    All,
}

/// Validated command-line settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub target: Target,
    pub timeout: Duration,
    pub resolv_conf: Option<PathBuf>,
    pub quiet: bool,
}

impl Args {
    pub fn into_settings(self) -> Result<Settings, LeaseholdError> {
        let secs = u64::try_from(self.timeout)
            .ok()
            .filter(|&secs| secs > 0)
            .ok_or_else(|| LeaseholdError::Config(format!("invalid timeout: {}", self.timeout)))?;

        let target = match (self.all, self.interface) {
            (true, _) => Target::All,
            (false, Some(name)) if !name.is_empty() => Target::Interface(name),
            (false, _) => {
                return Err(LeaseholdError::Config(
                    "missing -i/--interface (or use --all)".to_string(),
                ))
            }
        };

        let resolv_conf = (!self.resolv_conf.is_empty()).then(|| PathBuf::from(self.resolv_conf));

        Ok(Settings {
            target,
            timeout: Duration::from_secs(secs),
            resolv_conf,
            quiet: self.quiet,
        })
    }
}

/// Parameters for one negotiation on one interface.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub interface: String,
    pub mac_address: MacAddress,
    pub client_port: u16,
    pub server_port: u16,
    pub broadcast_address: Ipv4Addr,
    /// Overall deadline for the whole Discover → Ack exchange.
    pub timeout: Duration,
    /// Upper bound on a single socket read.
    pub read_timeout: Duration,
}

impl ClientConfig {
    pub fn new(interface: String, mac_address: MacAddress) -> Self {
        Self {
            interface,
            mac_address,
            client_port: 68,
            server_port: 67,
            broadcast_address: Ipv4Addr::BROADCAST,
            timeout: Duration::from_secs(10),
            read_timeout: Duration::from_millis(750),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::from((self.broadcast_address, self.server_port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Settings, LeaseholdError> {
        let args = Args::try_parse_from(std::iter::once("leasehold").chain(args.iter().copied()))
            .expect("arguments should parse");
        args.into_settings()
    }

    #[test]
    fn test_defaults() {
        let settings = parse(&["-i", "eth0"]).unwrap();
        assert_eq!(settings.target, Target::Interface("eth0".to_string()));
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert_eq!(settings.resolv_conf, Some(PathBuf::from("/etc/resolv.conf")));
        assert!(!settings.quiet);
    }

    #[test]
    fn test_all_and_quiet() {
        let settings = parse(&["--all", "--quiet", "-t", "3"]).unwrap();
        assert_eq!(settings.target, Target::All);
        assert_eq!(settings.timeout, Duration::from_secs(3));
        assert!(settings.quiet);
    }

    #[test]
    fn test_non_positive_timeout_is_fatal() {
        for timeout in ["0", "-5"] {
            let err = parse(&["-i", "eth0", "--timeout", timeout]).unwrap_err();
            assert!(matches!(err, LeaseholdError::Config(_)), "{timeout}");
        }
    }

    #[test]
    fn test_missing_target() {
        assert!(matches!(parse(&[]), Err(LeaseholdError::Config(_))));
    }

    #[test]
    fn test_empty_resolv_conf_disables_writer() {
        let settings = parse(&["-i", "eth0", "--resolv-conf", ""]).unwrap();
        assert_eq!(settings.resolv_conf, None);
    }

    #[test]
    fn test_client_config_server_addr() {
        let config = ClientConfig::new("eth0".to_string(), MacAddress::new([2, 0, 0, 0, 0, 1]));
        assert_eq!(
            config.server_addr(),
            "255.255.255.255:67".parse::<SocketAddr>().unwrap()
        );
        assert!(config.read_timeout < Duration::from_secs(1));
    }
}
