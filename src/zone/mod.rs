//! Zone management: the opaque record-upsert capability and the per-credentials
//! client cache.
//!
//! Domains that share a credentials name share one [`ZoneClient`]; the
//! [`ZoneManager`] constructs each client lazily on first use and guarantees
//! at most one construction per name even when the first requests race.

use crate::config::{Credentials, Domain, Shared};
use crate::error::Error;
use std::collections::HashMap;
use std::sync::Arc;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;
use tokio::sync::Mutex;

pub mod route53;

#[allow(clippy::module_name_repetitions)]
pub use route53::Route53Client;

/// A handle to the zone-management provider, scoped to one credentials set.
///
/// Implementations perform a single create-or-replace of an A record and
/// surface any provider failure as [`Error::Upstream`]. Retry and backoff are
/// deliberately not part of this contract.
#[async_trait::async_trait]
pub trait ZoneClient: Send + Sync {
    /// Upsert the A record `record` in zone `zone_id` to point at `ip`.
    async fn upsert(
        &self,
        zone_id: &str,
        record: &str,
        ip: &str,
        ttl: u32,
        comment: &str,
    ) -> Result<(), Error>;
}

/// Builds a [`ZoneClient`] for a credentials set. Injectable so tests can
/// observe construction and substitute fakes.
pub type ClientFactory = Box<dyn Fn(&Credentials) -> Arc<dyn ZoneClient> + Send + Sync>;

/// Resolves domains to zone clients, caching one client per credentials name.
///
/// Owned by the server instance, never static. The mutex covers the whole
/// check-construct-insert sequence so concurrent first requests for the same
/// credentials name observe a single client.
pub struct ZoneManager {
    config: Shared,
    clients: Mutex<HashMap<String, Arc<dyn ZoneClient>>>,
    connect: ClientFactory,
}

impl ZoneManager {
    /// A manager backed by [`Route53Client`]s.
    #[must_use]
    pub fn new(config: Shared) -> Self {
        Self::with_factory(config, Box::new(|creds| Arc::new(Route53Client::new(creds))))
    }

    #[must_use]
    pub fn with_factory(config: Shared, connect: ClientFactory) -> Self {
        Self {
            config,
            clients: Mutex::new(HashMap::new()),
            connect,
        }
    }

    /// Point the domain's A record at `ip` with the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`] (or a transport error) when the provider
    /// call fails; the caller decides whether to expose the detail.
    pub async fn update_domain(&self, domain: &Domain, ip: &str) -> Result<(), Error> {
        let client = self.client_for(domain).await;
        let comment = format!("ddns update {}", timestamp()?);
        client
            .upsert(&domain.zone_id, &domain.name, ip, self.config.ttl, &comment)
            .await
    }

    async fn client_for(&self, domain: &Domain) -> Arc<dyn ZoneClient> {
        let mut clients = self.clients.lock().await;
        if let Some(client) = clients.get(&domain.credentials) {
            return Arc::clone(client);
        }
        // Load-time validation guarantees the credentials reference resolves.
        let creds = &self.config.credentials[&domain.credentials];
        let client = (self.connect)(creds);
        clients.insert(domain.credentials.clone(), Arc::clone(&client));
        client
    }
}

/// Sortable UTC timestamp for change audit comments.
fn timestamp() -> Result<String, Error> {
    const FORMAT: &[FormatItem<'static>] =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");
    Ok(OffsetDateTime::now_utc().format(FORMAT)?)
}
