//! Clinic lifecycle: creation with auto-enrollment, listing, landing,
//! rename and cascading delete

use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::tenancy::require_membership;
use crate::{
    cache::ClinicListCache,
    context::RequestContext,
    error::{ApiError, ApiResult},
    models::{Clinic, Dashboard, Landing, NewClinic},
    repositories::Store,
    validation,
};

/// Clinic service
#[derive(Clone)]
pub struct ClinicService {
    store: Arc<dyn Store>,
    cache: Arc<dyn ClinicListCache>,
}

impl ClinicService {
    pub fn new(store: Arc<dyn Store>, cache: Arc<dyn ClinicListCache>) -> Self {
        Self { store, cache }
    }

    /// Create a clinic and enroll the acting user as its member.
    ///
    /// Both rows are written in one transaction; on success the user's
    /// cached clinic listing is dropped.
    pub async fn create_clinic(&self, ctx: &RequestContext, payload: NewClinic) -> ApiResult<Clinic> {
        let name = validation::clinic_name(&payload.name).map_err(ApiError::BadRequest)?;

        let (clinic, membership) = self
            .store
            .create_clinic_with_member(ctx.user_id(), &name)
            .await?;
        info!(
            "User {} created clinic {} (membership {})",
            ctx.user_id(),
            clinic.id,
            membership.id
        );

        self.invalidate_listings(&[ctx.user_id()]).await;
        Ok(clinic)
    }

    /// Clinics the acting user belongs to, served from cache when possible
    pub async fn list_clinics(&self, ctx: &RequestContext) -> ApiResult<Vec<Clinic>> {
        let user_id = ctx.user_id();

        match self.cache.get(user_id).await {
            Ok(Some(clinics)) => return Ok(clinics),
            Ok(None) => {}
            Err(e) => warn!("Clinic listing cache read failed for {}: {}", user_id, e),
        }

        let clinics = self.store.list_clinics_for_user(user_id).await?;
        if let Err(e) = self.cache.put(user_id, &clinics).await {
            warn!("Clinic listing cache write failed for {}: {}", user_id, e);
        }
        Ok(clinics)
    }

    /// Decide where the freshly authenticated user lands.
    ///
    /// A user without any membership is sent to clinic creation; that is an
    /// expected state, not an error. Always read from the store: a cached
    /// listing may predate the user's first clinic.
    pub async fn landing(&self, ctx: &RequestContext) -> ApiResult<Landing> {
        let clinics = self.store.list_clinics_for_user(ctx.user_id()).await?;
        if clinics.is_empty() {
            info!("User {} has no clinic yet", ctx.user_id());
            return Ok(Landing::ClinicForm);
        }

        Ok(Landing::Dashboard(Dashboard {
            email: ctx.user.email.clone(),
            clinics,
        }))
    }

    pub async fn get_clinic(&self, ctx: &RequestContext, clinic_id: Uuid) -> ApiResult<Clinic> {
        require_membership(self.store.as_ref(), ctx, clinic_id).await?;
        self.store
            .find_clinic(clinic_id)
            .await?
            .ok_or(ApiError::NotFound("Clinic"))
    }

    pub async fn rename_clinic(
        &self,
        ctx: &RequestContext,
        clinic_id: Uuid,
        payload: NewClinic,
    ) -> ApiResult<Clinic> {
        require_membership(self.store.as_ref(), ctx, clinic_id).await?;
        let name = validation::clinic_name(&payload.name).map_err(ApiError::BadRequest)?;

        let clinic = self
            .store
            .rename_clinic(clinic_id, &name)
            .await?
            .ok_or(ApiError::NotFound("Clinic"))?;

        let members = self.store.list_member_ids(clinic_id).await?;
        self.invalidate_listings(&members).await;
        Ok(clinic)
    }

    /// Delete a clinic together with everything it owns
    pub async fn delete_clinic(&self, ctx: &RequestContext, clinic_id: Uuid) -> ApiResult<()> {
        require_membership(self.store.as_ref(), ctx, clinic_id).await?;

        let members = self.store.list_member_ids(clinic_id).await?;
        if !self.store.delete_clinic(clinic_id).await? {
            return Err(ApiError::NotFound("Clinic"));
        }
        info!("User {} deleted clinic {}", ctx.user_id(), clinic_id);

        self.invalidate_listings(&members).await;
        Ok(())
    }

    /// Forget a user removed by the auth service; memberships cascade
    pub async fn remove_user(&self, user_id: Uuid) -> ApiResult<bool> {
        let removed = self.store.delete_user(user_id).await?;
        if removed {
            info!("Removed user {} and their memberships", user_id);
            self.invalidate_listings(&[user_id]).await;
        }
        Ok(removed)
    }

    // Cache failures never fail the write that triggered them; entries
    // expire on their own TTL.
    async fn invalidate_listings(&self, user_ids: &[Uuid]) {
        if let Err(e) = self.cache.invalidate(user_ids).await {
            error!("Failed to invalidate clinic listings: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::MemoryClinicListCache,
        context::SessionUser,
        repositories::{ClinicRepository, DoctorRepository, MembershipRepository, MemoryStore},
    };
    use chrono::NaiveTime;

    struct Fixture {
        store: MemoryStore,
        cache: MemoryClinicListCache,
        service: ClinicService,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let cache = MemoryClinicListCache::new();
        let service = ClinicService::new(Arc::new(store.clone()), Arc::new(cache.clone()));
        Fixture {
            store,
            cache,
            service,
        }
    }

    fn ctx(id: Uuid) -> RequestContext {
        RequestContext::new(SessionUser {
            id,
            email: format!("{}@example.com", id),
        })
    }

    fn named(name: &str) -> NewClinic {
        NewClinic {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_clinic_enrolls_creator() {
        let f = fixture();
        let user = ctx(Uuid::new_v4());

        let clinic = f
            .service
            .create_clinic(&user, named("Clínica Central"))
            .await
            .unwrap();

        assert_eq!(clinic.name, "Clínica Central");
        assert_eq!(f.store.clinic_and_membership_count().await, (1, 1));
        let memberships = f.store.list_memberships_for_user(user.user_id()).await.unwrap();
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].clinic_id, clinic.id);
    }

    #[tokio::test]
    async fn test_blank_name_writes_nothing() {
        let f = fixture();
        let result = f.service.create_clinic(&ctx(Uuid::new_v4()), named("   ")).await;

        assert!(matches!(result, Err(ApiError::BadRequest(_))));
        assert_eq!(f.store.clinic_and_membership_count().await, (0, 0));
    }

    #[tokio::test]
    async fn test_create_invalidates_cached_listing() {
        let f = fixture();
        let user = ctx(Uuid::new_v4());

        assert!(f.service.list_clinics(&user).await.unwrap().is_empty());
        assert!(f.cache.contains(user.user_id()).await);

        f.service.create_clinic(&user, named("North")).await.unwrap();
        assert!(!f.cache.contains(user.user_id()).await);

        let clinics = f.service.list_clinics(&user).await.unwrap();
        assert_eq!(clinics.len(), 1);
        assert!(f.cache.contains(user.user_id()).await);
    }

    #[tokio::test]
    async fn test_landing_depends_on_membership() {
        let f = fixture();
        let user = ctx(Uuid::new_v4());

        assert_eq!(f.service.landing(&user).await.unwrap(), Landing::ClinicForm);

        let clinic = f.service.create_clinic(&user, named("North")).await.unwrap();
        match f.service.landing(&user).await.unwrap() {
            Landing::Dashboard(dashboard) => {
                assert_eq!(dashboard.email, user.user.email);
                assert_eq!(dashboard.clinics, vec![clinic]);
            }
            Landing::ClinicForm => panic!("member routed to clinic form"),
        }
    }

    #[tokio::test]
    async fn test_landing_ignores_stale_empty_listing() {
        let f = fixture();
        let user = ctx(Uuid::new_v4());
        let before = f.store.list_clinics_for_user(user.user_id()).await.unwrap();

        let clinic = f.service.create_clinic(&user, named("North")).await.unwrap();
        f.cache.put(user.user_id(), &before).await.unwrap();

        match f.service.landing(&user).await.unwrap() {
            Landing::Dashboard(dashboard) => assert_eq!(dashboard.clinics, vec![clinic]),
            Landing::ClinicForm => panic!("member routed to clinic form"),
        }
    }

    #[tokio::test]
    async fn test_long_clinic_name_is_accepted() {
        let f = fixture();
        let user = ctx(Uuid::new_v4());
        let name = "a".repeat(101);

        let clinic = f.service.create_clinic(&user, named(&name)).await.unwrap();
        assert_eq!(clinic.name, name);
    }

    #[tokio::test]
    async fn test_outsider_cannot_touch_clinic() {
        let f = fixture();
        let owner = ctx(Uuid::new_v4());
        let outsider = ctx(Uuid::new_v4());
        let clinic = f.service.create_clinic(&owner, named("North")).await.unwrap();

        assert!(matches!(
            f.service.get_clinic(&outsider, clinic.id).await,
            Err(ApiError::Forbidden)
        ));
        assert!(matches!(
            f.service.rename_clinic(&outsider, clinic.id, named("Mine")).await,
            Err(ApiError::Forbidden)
        ));
        assert!(matches!(
            f.service.delete_clinic(&outsider, clinic.id).await,
            Err(ApiError::Forbidden)
        ));
        assert_eq!(f.service.get_clinic(&owner, clinic.id).await.unwrap().name, "North");
    }

    #[tokio::test]
    async fn test_rename_refreshes_updated_at() {
        let f = fixture();
        let owner = ctx(Uuid::new_v4());
        let clinic = f.service.create_clinic(&owner, named("North")).await.unwrap();

        let renamed = f
            .service
            .rename_clinic(&owner, clinic.id, named(" North Wing "))
            .await
            .unwrap();

        assert_eq!(renamed.name, "North Wing");
        assert_eq!(renamed.created_at, clinic.created_at);
        assert!(renamed.updated_at >= clinic.updated_at);
    }

    #[tokio::test]
    async fn test_delete_cascades_and_clears_listing() {
        let f = fixture();
        let owner = ctx(Uuid::new_v4());
        let clinic = f.service.create_clinic(&owner, named("North")).await.unwrap();
        f.store
            .create_doctor(
                clinic.id,
                &crate::models::DoctorInput {
                    name: "Dr. Lima".to_string(),
                    avatar_image_url: None,
                    available_from_weekday: 1,
                    available_to_weekday: 5,
                    available_from_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                    available_to_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                    license_id: "CRM-9".to_string(),
                    specialty: "Pediatria".to_string(),
                    price_in_cents: 0,
                },
            )
            .await
            .unwrap();
        f.service.list_clinics(&owner).await.unwrap();

        f.service.delete_clinic(&owner, clinic.id).await.unwrap();

        assert_eq!(f.store.dependent_row_count(clinic.id).await, 0);
        assert!(!f.cache.contains(owner.user_id()).await);
        assert_eq!(f.service.landing(&owner).await.unwrap(), Landing::ClinicForm);
    }

    #[tokio::test]
    async fn test_remove_user_drops_memberships_but_keeps_clinic() {
        let f = fixture();
        let owner = ctx(Uuid::new_v4());
        let clinic = f.service.create_clinic(&owner, named("North")).await.unwrap();

        assert!(f.service.remove_user(owner.user_id()).await.unwrap());

        assert_eq!(f.store.clinic_and_membership_count().await, (1, 0));
        assert!(f.store.find_clinic(clinic.id).await.unwrap().is_some());
        assert!(!f.service.remove_user(owner.user_id()).await.unwrap());
    }
}
