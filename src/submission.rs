//! Contact submission model and validation.
//!
//! A submission lives for exactly one request: it is parsed from the raw
//! body, every field is HTML-escaped, and the escaped copy is forwarded.
//! Only presence is enforced; email and phone formats are left to the
//! browser's hints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumIter, IntoStaticStr};
use utoipa::ToSchema;

use crate::error::ValidationError;
use crate::escape::escape_html;

/// The four required fields of a contact submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum SubmissionField {
    /// Sender's full name.
    Name,
    /// Sender's email address.
    Email,
    /// Sender's phone number.
    Phone,
    /// Free-form message.
    Message,
}

/// A contact form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ContactSubmission {
    /// Sender's full name.
    #[schema(example = "Jo Smith")]
    pub name: String,
    /// Sender's email address.
    #[schema(example = "jo@example.com")]
    pub email: String,
    /// Sender's phone number.
    #[schema(example = "1234567890")]
    pub phone: String,
    /// Free-form message.
    #[schema(example = "Hello!")]
    pub message: String,
}

impl ContactSubmission {
    /// Create a submission from its four fields.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            message: message.into(),
        }
    }

    /// Parse a raw request body.
    ///
    /// The body must be a JSON object carrying all four fields with a
    /// non-null value. Strings are taken verbatim and integers as their
    /// decimal text; fractions, exponents and any other value type are
    /// rejected. Unknown keys are
    /// dropped.
    pub fn from_json_bytes(body: &[u8]) -> Result<Self, ValidationError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|_| ValidationError::MalformedBody)?;
        match value {
            Value::Object(map) => Self::from_object(&map),
            _ => Err(ValidationError::MalformedBody),
        }
    }

    fn from_object(map: &Map<String, Value>) -> Result<Self, ValidationError> {
        Ok(Self {
            name: field_text(map, SubmissionField::Name)?,
            email: field_text(map, SubmissionField::Email)?,
            phone: field_text(map, SubmissionField::Phone)?,
            message: field_text(map, SubmissionField::Message)?,
        })
    }

    /// Consume the submission, HTML-escaping every field.
    pub fn escaped(self) -> EscapedSubmission {
        EscapedSubmission(Self {
            name: escape_html(&self.name),
            email: escape_html(&self.email),
            phone: escape_html(&self.phone),
            message: escape_html(&self.message),
        })
    }
}

fn field_text(map: &Map<String, Value>, field: SubmissionField) -> Result<String, ValidationError> {
    let key: &'static str = field.into();
    match map.get(key) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        // `1e3` would otherwise be forwarded as "1000.0".
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        Some(_) => Err(ValidationError::InvalidFieldType(field)),
    }
}

/// A submission whose fields have been HTML-escaped exactly once.
///
/// Only this type can be forwarded upstream, so raw values never leave the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EscapedSubmission(ContactSubmission);
