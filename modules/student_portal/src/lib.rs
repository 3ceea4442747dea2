// === PUBLIC CONTRACT ===
// DTOs, the API trait and the errors other crates consume.
pub mod contract;

pub use contract::{client, error, model};

// === MODULE WIRING ===
pub mod config;
pub mod module;
pub use config::StudentPortalConfig;
pub use module::StudentPortal;

// === FLOWS ===
// Login, registration, dashboard and session handling on top of the contract.
pub mod domain;
pub use domain::service::{Outcome, PortalService, Registered, Route};

// === ADAPTERS ===
// HTTP client for the student API and session stores.
pub mod infra;
