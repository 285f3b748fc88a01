//! The protocol-agnostic update operation shared by both API dialects.

use crate::config::Shared;
use crate::zone::ZoneManager;
use std::sync::Arc;

/// Parameters extracted from an inbound update request. Adapters that fail to
/// parse the `Authorization` header pass empty credentials, which authenticate
/// the same as wrong ones.
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    pub host: String,
    pub ip: String,
    pub username: String,
    pub password: String,
}

/// Outcome of an update attempt, rendered per dialect at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The zone now points the host at this address.
    Updated { ip: String },
    /// A required parameter was missing or empty.
    BadRequest { detail: String },
    /// The host isn't a managed domain.
    NoSuchDomain,
    /// Missing, unparseable, or incorrect credentials.
    Unauthorized,
    /// Valid credentials, but the user isn't on the domain's allow-list.
    Forbidden,
    /// The zone provider call failed.
    Upstream { detail: String },
}

pub struct Updater {
    config: Shared,
    zones: Arc<ZoneManager>,
}

impl Updater {
    #[must_use]
    pub fn new(config: Shared, zones: Arc<ZoneManager>) -> Self {
        Self { config, zones }
    }

    /// Run the full update pipeline for one request.
    ///
    /// The check order is deliberate and load-bearing: domain existence is
    /// checked before credentials, so an authentication failure always reads
    /// as "unauthorized" rather than revealing whether the domain exists.
    pub async fn apply(&self, req: &UpdateRequest) -> UpdateOutcome {
        if req.host.is_empty() || req.ip.is_empty() {
            return UpdateOutcome::BadRequest {
                detail: "missing host or ip".to_string(),
            };
        }

        let Some(domain) = self.config.find_domain(&req.host) else {
            return UpdateOutcome::NoSuchDomain;
        };

        let Some(user) = self.config.authenticate(&req.username, &req.password) else {
            return UpdateOutcome::Unauthorized;
        };

        if !self.config.authorize(user, domain) {
            return UpdateOutcome::Forbidden;
        }

        match self.zones.update_domain(domain, &req.ip).await {
            Ok(()) => {
                tracing::info!("updated {} to {}", domain.name, req.ip);
                UpdateOutcome::Updated {
                    ip: req.ip.clone(),
                }
            }
            Err(err) => {
                tracing::error!("failed to update {}: {err}", domain.name);
                UpdateOutcome::Upstream {
                    detail: err.to_string(),
                }
            }
        }
    }
}
