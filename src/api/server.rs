use crate::api::routes;
use crate::config::Shared;
use crate::solver::DynSolver;
use axum::Router;
use std::future::Future;

#[derive(Clone)]
pub(super) struct AppState {
    pub config: Shared,
    pub solver: DynSolver,
}

/// The webhook [`Router`], without a listener.
pub fn router(config: Shared, solver: DynSolver) -> Router {
    routes::new(AppState { config, solver })
}

/// Bind [`Config::api_bind_addr`][crate::config::Config::api_bind_addr] and return the future
/// serving the webhook on it.
///
/// # Errors
///
/// Returns a [`hyper::Error`] if the address can't be bound.
pub fn new(
    config: Shared,
    solver: DynSolver,
) -> hyper::Result<impl Future<Output = hyper::Result<()>>> {
    let server = axum::Server::try_bind(&config.api_bind_addr)?;
    Ok(server.serve(router(config, solver).into_make_service()))
}
