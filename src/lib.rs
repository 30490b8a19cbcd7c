//! # Leasehold - A Minimal DHCPv4 Client
//!
//! Leasehold acquires an IPv4 lease for a network interface by speaking the
//! DORA (Discover, Offer, Request, Acknowledge) exchange directly at the
//! packet level, then hands the resulting address, prefix, gateway and DNS
//! servers to the host.
//!
//! ## Features
//!
//! - Hand-rolled DHCPv4 codec (BOOTP header, magic cookie, TLV options)
//! - Replies matched to the in-flight transaction; stray traffic is dropped
//! - A single overall deadline per interface with short rolling reads
//! - One interface or every Ethernet-like interface in turn
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = leasehold::runner::run("eth0", Duration::from_secs(10)).await?;
//!     println!("Obtained {} via {:?}", config.cidr(), config.gateway);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod lease;
pub mod network;
pub mod runner;
pub mod v4;

pub use client::DhcpClient;
pub use config::{Args, ClientConfig, Settings};
pub use error::LeaseholdError;
pub use lease::{translate, InterfaceConfig};
pub use network::{Transport, UdpTransport};
pub use v4::MacAddress;
