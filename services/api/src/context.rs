//! Request-scoped context
//!
//! The session middleware resolves the caller once per request and stores a
//! [`RequestContext`] in the request extensions. Handlers pass it explicitly
//! to every service call; nothing reads session state from anywhere else.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the authenticated caller, as vouched for by the auth service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
}

/// Per-request context handed to services
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user: SessionUser,
}

impl RequestContext {
    pub fn new(user: SessionUser) -> Self {
        Self { user }
    }

    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}
