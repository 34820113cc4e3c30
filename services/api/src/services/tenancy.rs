//! Tenant-access guard

use tracing::warn;
use uuid::Uuid;

use crate::{
    context::RequestContext,
    error::{ApiError, ApiResult},
    models::Membership,
    repositories::Store,
};

/// Ensure the acting user is a member of `clinic_id`.
///
/// A clinic that does not exist is reported the same way as one the user
/// cannot access, so callers cannot discover other tenants' ids.
pub async fn require_membership(
    store: &dyn Store,
    ctx: &RequestContext,
    clinic_id: Uuid,
) -> ApiResult<Membership> {
    match store.find_membership(ctx.user_id(), clinic_id).await? {
        Some(membership) => Ok(membership),
        None => {
            warn!(
                "User {} denied access to clinic {}",
                ctx.user_id(),
                clinic_id
            );
            Err(ApiError::Forbidden)
        }
    }
}
