//! Company model: the organisation that owns users and doctors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A registered company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub email: String,
    /// Public URL of the profile image, if one was uploaded.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Text fields of the `create-company` multipart form.
#[derive(Debug, Default, Validate)]
pub struct CreateCompanyForm {
    #[validate(required(message = "The name field is required."))]
    pub name: Option<String>,

    #[validate(required(message = "The phone field is required."))]
    pub phone: Option<String>,

    #[validate(required(message = "The address field is required."))]
    pub address: Option<String>,

    #[validate(
        required(message = "The email field is required."),
        email(message = "The email field must be a valid email address.")
    )]
    pub email: Option<String>,
}

/// A validated company, ready to insert.
#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub email: String,
}

impl From<CreateCompanyForm> for NewCompany {
    /// Only meaningful after the form passed validation; absent fields become empty.
    fn from(form: CreateCompanyForm) -> Self {
        Self {
            name: form.name.unwrap_or_default(),
            phone: form.phone.unwrap_or_default(),
            address: form.address.unwrap_or_default(),
            email: form.email.unwrap_or_default(),
        }
    }
}
