//! Tenant-aware services
//!
//! Handlers call into these with an explicit [`RequestContext`]; every
//! clinic-scoped operation passes the membership guard first.
//!
//! [`RequestContext`]: crate::context::RequestContext

pub mod clinics;
pub mod scheduling;
pub mod tenancy;

pub use clinics::ClinicService;
pub use scheduling::SchedulingService;
