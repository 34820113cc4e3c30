//! Domain models for request and response payloads and stored rows

pub mod appointment;
pub mod clinic;
pub mod doctor;
pub mod patient;

pub use appointment::{Appointment, AppointmentQuery, NewAppointment, RescheduleAppointment};
pub use clinic::{Clinic, Dashboard, Landing, Membership, NewClinic};
pub use doctor::{Availability, Doctor, DoctorInput};
pub use patient::{Patient, PatientInput, Sex};
