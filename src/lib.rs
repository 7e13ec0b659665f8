// src/lib.rs

use sea_orm::DatabaseConnection;
use services::documents::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub documents: DocumentStore,
    /// When true, persistence failures echo their detail to the caller
    pub debug: bool,
}

pub mod entities {
    pub mod prelude;
    pub mod agent_applications;
    pub mod agent_tiers;
    pub mod agents;
    pub mod commissions;
    pub mod orders;
    pub mod users;
}

pub mod services {
    pub mod commission;
    pub mod documents;
    pub mod review;
}

pub mod models;
pub mod handlers;
