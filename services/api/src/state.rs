//! Application state shared across handlers

use std::sync::Arc;

use crate::{
    cache::ClinicListCache,
    repositories::Store,
    services::{ClinicService, SchedulingService},
    session::SessionVerifier,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: SessionVerifier,
    pub clinics: ClinicService,
    pub scheduling: SchedulingService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        cache: Arc<dyn ClinicListCache>,
        sessions: SessionVerifier,
    ) -> Self {
        Self {
            clinics: ClinicService::new(store.clone(), cache),
            scheduling: SchedulingService::new(store.clone()),
            store,
            sessions,
        }
    }
}
