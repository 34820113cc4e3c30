//! Doctor model and weekly availability window

use chrono::{DateTime, Datelike, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Doctor entity, owned by exactly one clinic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Doctor {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub name: String,
    pub avatar_image_url: Option<String>,
    /// 0 = Sunday ... 6 = Saturday
    pub available_from_weekday: i16,
    pub available_to_weekday: i16,
    pub available_from_time: NaiveTime,
    pub available_to_time: NaiveTime,
    pub license_id: String,
    pub specialty: String,
    pub price_in_cents: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Doctor {
    pub fn availability(&self) -> Availability {
        Availability {
            from_weekday: self.available_from_weekday,
            to_weekday: self.available_to_weekday,
            from_time: self.available_from_time,
            to_time: self.available_to_time,
        }
    }
}

/// Doctor creation and update payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorInput {
    pub name: String,
    #[serde(default)]
    pub avatar_image_url: Option<String>,
    pub available_from_weekday: i16,
    pub available_to_weekday: i16,
    pub available_from_time: NaiveTime,
    pub available_to_time: NaiveTime,
    pub license_id: String,
    pub specialty: String,
    pub price_in_cents: i32,
}

/// Weekly availability window of a doctor.
///
/// Advisory only: appointments outside the window are still accepted. The
/// weekday range may wrap around the week (Friday to Monday is `5..=1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    pub from_weekday: i16,
    pub to_weekday: i16,
    pub from_time: NaiveTime,
    pub to_time: NaiveTime,
}

impl Availability {
    pub fn includes_weekday(&self, weekday: i16) -> bool {
        if self.from_weekday <= self.to_weekday {
            (self.from_weekday..=self.to_weekday).contains(&weekday)
        } else {
            weekday >= self.from_weekday || weekday <= self.to_weekday
        }
    }

    /// Whether `at` falls on an available weekday within the daily hours
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        let weekday = at.weekday().num_days_from_sunday() as i16;
        let time = at.time();
        self.includes_weekday(weekday) && time >= self.from_time && time < self.to_time
    }
}
