//! ddns
//!
//! A small dynamic-DNS update daemon. Authenticated HTTP requests bind a
//! hostname to an IPv4 address, applied as an UPSERT of the matching A record
//! in a Route53 hosted zone. Two wire dialects are served over the same
//! pipeline: a native JSON API and a dyndns2-compatible plaintext API, so
//! off-the-shelf router firmware can talk to it unchanged.
//!
//! Access control is static: the YAML configuration names zone credentials,
//! the domains they manage, and the users allowed to update each domain.
#![warn(clippy::pedantic)]

pub mod api;
pub mod config;
pub mod error;
pub mod update;
pub mod zone;

pub use config::{Config, Shared};
pub use error::Error;
pub use update::{UpdateOutcome, UpdateRequest, Updater};
pub use zone::{ZoneClient, ZoneManager};
