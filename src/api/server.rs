use crate::api::routes;
use crate::update::Updater;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Clone)]
pub(super) struct AppState {
    pub updater: Arc<Updater>,
}

/// Serve the update API on `bind_addr` until `shutdown` resolves, then drain
/// in-flight requests before closing the listener.
pub fn new(
    bind_addr: SocketAddr,
    updater: Arc<Updater>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> impl Future<Output = hyper::Result<()>> {
    axum::Server::bind(&bind_addr)
        .serve(router(updater).into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
}

/// The bare router, for driving requests through in tests.
#[must_use]
pub fn router(updater: Arc<Updater>) -> Router {
    routes::new(AppState { updater })
}
