//! Doctor model: practitioners listed under a company.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::user::UserSummary;

/// A doctor record.
///
/// `specialty` travels as `speciatly` on the wire: existing clients were
/// built against that spelling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "speciatly", alias = "specialty")]
    pub specialty: String,
    pub email: String,
    pub status: DoctorStatus,
    /// Public URL of the profile image, if one was uploaded.
    pub image: Option<String>,
    /// Owning company, stamped from the creator's token.
    pub company_id: Uuid,
    /// Creating user, stamped from the creator's token.
    pub user_id: Uuid,
    /// Creator projection, filled in by listing queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Availability of a doctor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoctorStatus {
    #[serde(rename = "available")]
    Available,
    #[serde(rename = "on leave")]
    OnLeave,
}

impl DoctorStatus {
    pub const ALL: [DoctorStatus; 2] = [DoctorStatus::Available, DoctorStatus::OnLeave];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::OnLeave => "on leave",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }
}

/// Text fields of the `create-doctor` multipart form.
#[derive(Debug, Default, Validate)]
pub struct CreateDoctorForm {
    #[validate(
        required(message = "The name field is required."),
        length(max = 255, message = "The name field must not be greater than 255 characters.")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "The speciatly field is required."),
        length(max = 255, message = "The speciatly field must not be greater than 255 characters.")
    )]
    pub specialty: Option<String>,

    #[validate(
        required(message = "The email field is required."),
        email(message = "The email field must be a valid email address.")
    )]
    pub email: Option<String>,

    #[validate(required(message = "The status field is required."))]
    pub status: Option<String>,
}

/// A validated doctor, ready to insert.
#[derive(Debug, Clone)]
pub struct NewDoctor {
    pub name: String,
    pub specialty: String,
    pub email: String,
    pub status: DoctorStatus,
}

impl CreateDoctorForm {
    /// The parsed status, when one was supplied and is a known value.
    pub fn parsed_status(&self) -> Option<DoctorStatus> {
        self.status.as_deref().and_then(DoctorStatus::parse)
    }

    /// Convert a validated form. Returns `None` if the status is unknown.
    pub fn into_new(self) -> Option<NewDoctor> {
        let status = self.parsed_status()?;
        Some(NewDoctor {
            name: self.name.unwrap_or_default(),
            specialty: self.specialty.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_its_wire_name() {
        assert_eq!(DoctorStatus::parse("on leave"), Some(DoctorStatus::OnLeave));
        assert_eq!(DoctorStatus::parse("available"), Some(DoctorStatus::Available));
        assert_eq!(DoctorStatus::parse("retired"), None);
        assert_eq!(
            serde_json::to_string(&DoctorStatus::OnLeave).unwrap(),
            "\"on leave\""
        );
    }

    #[test]
    fn specialty_serializes_with_legacy_spelling() {
        let doctor = Doctor {
            id: Uuid::nil(),
            name: "Dr. Ada".into(),
            specialty: "Cardiology".into(),
            email: "ada@clinic.test".into(),
            status: DoctorStatus::Available,
            image: None,
            company_id: Uuid::nil(),
            user_id: Uuid::nil(),
            user: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&doctor).unwrap();
        assert_eq!(json["speciatly"], "Cardiology");
        assert!(json.get("specialty").is_none());
        assert!(json["image"].is_null());
        assert!(json.get("user").is_none());
    }
}
