//! Client for the MAAS bare metal provisioning REST API.
//!
//! Every request is signed with an OAuth1 `Authorization` header derived
//! from a MAAS API key (`<consumer key>:<token key>:<token secret>`).
//! Resources are reached through a [`ClientSet`], which shares one signed
//! transport between all resource controllers.
//!
//! # Example
//!
//! ```rust,ignore
//! use maas_client::ClientSet;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let clients = ClientSet::new("http://maas.example:5240/MAAS", "ck:tk:ts")?;
//!
//!     // Allocate a machine in a zone
//!     let mut machines = clients.machines();
//!     let machine = machines.allocator().with_zone("az1").allocate().await?;
//!
//!     // Deploy it
//!     let mut handle = clients.machines().machine(&machine.system_id);
//!     let deployed = handle
//!         .deployer()
//!         .set_os_system("ubuntu")
//!         .set_distro_series("jammy")
//!         .deploy()
//!         .await?;
//!     println!("{} is {}", deployed.hostname, deployed.state);
//!
//!     Ok(())
//! }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod client;
pub mod clientset;
pub mod config;
pub mod error;
pub mod params;
pub mod resources;

pub use client::{ApiClient, Envelope};
pub use clientset::ClientSet;
pub use config::ClientConfig;
pub use error::{MaasError, Result};
pub use params::Params;
