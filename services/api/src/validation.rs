//! Input validation and normalization
//!
//! Every payload is checked here before it reaches a repository. Validators
//! return the normalized value (trimmed, lower-cased email) or a message
//! suitable for the caller.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{DoctorInput, PatientInput};

const MAX_NAME_LEN: usize = 100;

fn required(field: &str, value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} is required", field));
    }
    Ok(trimmed.to_string())
}

fn name(field: &str, value: &str) -> Result<String, String> {
    let trimmed = required(field, value)?;
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(format!(
            "{} must be at most {} characters long",
            field, MAX_NAME_LEN
        ));
    }
    Ok(trimmed)
}

/// Validate a clinic name: any non-blank text, trimmed
pub fn clinic_name(value: &str) -> Result<String, String> {
    required("Name", value)
}

/// Validate email
pub fn email(value: &str) -> Result<String, String> {
    let email = required("Email", value)?.to_lowercase();

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9-]+(\.[a-z0-9-]+)*\.[a-z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(&email) {
        return Err("Invalid email format".to_string());
    }

    Ok(email)
}

/// Validate phone: digits with optional `+`, spaces, dashes and parentheses
pub fn phone(value: &str) -> Result<String, String> {
    let phone = required("Phone", value)?;

    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX.get_or_init(|| {
        Regex::new(r"^\+?[0-9][0-9 ()\-]{5,24}$").expect("Failed to compile phone regex")
    });

    if !regex.is_match(&phone) {
        return Err("Invalid phone number".to_string());
    }

    Ok(phone)
}

fn weekday(field: &str, value: i16) -> Result<i16, String> {
    if !(0..=6).contains(&value) {
        return Err(format!("{} must be between 0 (Sunday) and 6 (Saturday)", field));
    }
    Ok(value)
}

/// Validate and normalize a doctor payload
pub fn doctor(input: DoctorInput) -> Result<DoctorInput, String> {
    if input.available_from_time >= input.available_to_time {
        return Err("Availability start time must be before end time".to_string());
    }

    if input.price_in_cents < 0 {
        return Err("Price must not be negative".to_string());
    }

    let avatar_image_url = input
        .avatar_image_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty());

    Ok(DoctorInput {
        name: name("Name", &input.name)?,
        avatar_image_url,
        available_from_weekday: weekday("Availability start weekday", input.available_from_weekday)?,
        available_to_weekday: weekday("Availability end weekday", input.available_to_weekday)?,
        available_from_time: input.available_from_time,
        available_to_time: input.available_to_time,
        license_id: required("License id", &input.license_id)?,
        specialty: required("Specialty", &input.specialty)?,
        price_in_cents: input.price_in_cents,
    })
}

/// Validate and normalize a patient payload
pub fn patient(input: PatientInput) -> Result<PatientInput, String> {
    Ok(PatientInput {
        name: name("Name", &input.name)?,
        email: email(&input.email)?,
        phone: phone(&input.phone)?,
        birth_date: input.birth_date,
        sex: input.sex,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sex;
    use chrono::NaiveTime;

    fn doctor_input() -> DoctorInput {
        DoctorInput {
            name: "  Dra. Ana Souza ".to_string(),
            avatar_image_url: Some("   ".to_string()),
            available_from_weekday: 1,
            available_to_weekday: 5,
            available_from_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            available_to_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            license_id: "CRM/SP 123456".to_string(),
            specialty: "Cardiologia".to_string(),
            price_in_cents: 25000,
        }
    }

    #[test]
    fn test_clinic_name_is_trimmed() {
        assert_eq!(clinic_name("  Clínica Central  ").unwrap(), "Clínica Central");
    }

    #[test]
    fn test_blank_clinic_name_is_rejected() {
        assert_eq!(clinic_name("").unwrap_err(), "Name is required");
        assert_eq!(clinic_name(" \t ").unwrap_err(), "Name is required");
    }

    #[test]
    fn test_long_clinic_name_is_accepted() {
        let long = "a".repeat(250);
        assert_eq!(clinic_name(&format!(" {} ", long)).unwrap(), long);
    }

    #[test]
    fn test_email_is_normalized() {
        assert_eq!(email(" Maria@Example.COM ").unwrap(), "maria@example.com");
        assert!(email("not-an-email").is_err());
        assert!(email("").is_err());
    }

    #[test]
    fn test_email_accepts_punctuated_local_part() {
        assert_eq!(email("O'Brien@example.com").unwrap(), "o'brien@example.com");
        assert!(email("first.last+tag@mail.example.co").is_ok());
        assert!(email("a b@example.com").is_err());
        assert!(email("user@example").is_err());
    }

    #[test]
    fn test_phone_format() {
        assert!(phone("+55 (11) 99999-0000").is_ok());
        assert!(phone("12").is_err());
        assert!(phone("call me").is_err());
    }

    #[test]
    fn test_doctor_is_normalized() {
        let doctor = doctor(doctor_input()).unwrap();
        assert_eq!(doctor.name, "Dra. Ana Souza");
        assert_eq!(doctor.avatar_image_url, None);
    }

    #[test]
    fn test_doctor_weekday_out_of_range() {
        let mut input = doctor_input();
        input.available_to_weekday = 7;
        assert!(doctor(input).unwrap_err().contains("between 0"));
    }

    #[test]
    fn test_doctor_hours_must_be_ordered() {
        let mut input = doctor_input();
        input.available_to_time = input.available_from_time;
        assert!(doctor(input).is_err());
    }

    #[test]
    fn test_doctor_price_must_not_be_negative() {
        let mut input = doctor_input();
        input.price_in_cents = -1;
        assert_eq!(doctor(input).unwrap_err(), "Price must not be negative");
    }

    #[test]
    fn test_patient_is_normalized() {
        let patient = patient(PatientInput {
            name: "João".to_string(),
            email: "JOAO@Example.com".to_string(),
            phone: "11 98888-7777".to_string(),
            birth_date: None,
            sex: Sex::Male,
        })
        .unwrap();
        assert_eq!(patient.email, "joao@example.com");
    }
}
