//! HTTP API for binding hostnames to addresses.
//!
//! Two dialects share one update pipeline.
//!
//! # API Endpoints
//!
//! ## `/update` (GET)
//!
//!   The native JSON dialect. Query parameters `host` and `ip`; Basic
//!   authentication required. Responds with
//!
//!   ```json
//!   {"status":"ok","ip":"203.0.113.7"}
//!   ```
//!
//!   on success, or `{"status":"error","error":"..."}` with a matching HTTP
//!   status: 400 for a missing parameter, 401 for missing or incorrect
//!   credentials, 403 for a user not on the domain's allow-list, 404 for an
//!   unknown method, path, or domain, and 500 when the zone provider fails.
//!
//! ## `/nic/update` (GET)
//!
//!   The dyndns2-compatible plaintext dialect. Query parameters `hostname`
//!   and `myip`; Basic authentication required. Responds with the legacy
//!   tokens: `good <ip>` on success, `badagent` (200) for malformed requests
//!   including non-GET methods, `nohost` (200) for an unknown hostname,
//!   `badauth` (401 or 403) for authentication and authorization failures,
//!   and `911` (500) when the zone provider fails.

mod logging;
mod routes;
pub mod server;

pub use server::{new, router};
