//! Multi-tenant clinic scheduling API
//!
//! Clinics are the tenant boundary. Authenticated users create clinics, are
//! enrolled as members of the clinics they create, and manage the doctors,
//! patients and appointments of clinics they belong to.

pub mod cache;
pub mod context;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod session;
pub mod settings;
pub mod state;
pub mod validation;

pub use state::AppState;
