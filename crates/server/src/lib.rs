use std::sync::Arc;

use assignment::{AssignmentConfig, AssignmentEngine};
use axum::Router;
use events::EventBus;
use store::TaskStore;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod error;
pub mod middleware;
pub mod routes;

/// Explicitly constructed application state; every handler reaches the
/// store, the assignment engine and the bus through this.
#[derive(Clone)]
pub struct AppState {
    store: Arc<TaskStore>,
    engine: Arc<AssignmentEngine>,
    bus: Arc<EventBus>,
}

impl AppState {
    pub fn new(config: AssignmentConfig) -> Self {
        let bus = Arc::new(EventBus::new());
        let store = Arc::new(TaskStore::new(bus.clone()));
        let engine = Arc::new(AssignmentEngine::new(store.clone(), bus.clone(), config));
        Self { store, engine, bus }
    }

    pub fn from_env() -> Self {
        Self::new(AssignmentConfig::from_env())
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    pub fn engine(&self) -> &Arc<AssignmentEngine> {
        &self.engine
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::tasks::router(&state))
        .merge(routes::assignments::router())
        .merge(routes::events::router());

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
