//! Agent application request/response models
//!
//! Models for the applicant-facing endpoints: submission form assembled
//! from multipart fields, field-level validation, and the status payload.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::entities::agent_applications::ApplicationStatus;
use crate::services::documents::DocumentUpload;

lazy_static! {
    /// Safaricom/Airtel mobile numbers: +254 or 0, then 7xx/1xx and 8 digits
    static ref PHONE_RE: Regex = Regex::new(r"^(\+254|0)[17]\d{8}$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// Accepted government ID types
pub const ID_TYPES: [&str; 2] = ["National ID", "Passport"];

/// Accepted study-year labels
pub const YEARS_OF_STUDY: [&str; 6] = [
    "Year 1", "Year 2", "Year 3", "Year 4", "Year 5", "Year 6",
];

/// Generic error payload shared by all endpoints
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Per-field validation messages, Laravel-style
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// 422 payload carrying per-field messages
#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    pub error: String,
    pub errors: FieldErrors,
}

impl ValidationErrorResponse {
    pub fn new(errors: FieldErrors) -> Self {
        Self {
            error: "Validation failed".to_string(),
            errors,
        }
    }
}

/// Raw submission form as collected from the multipart body. Every field is
/// optional at this stage; `validate` turns it into a `ValidatedApplication`
/// or a field->messages map.
#[derive(Debug, Default)]
pub struct SubmitApplicationForm {
    pub full_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub phone_number: Option<String>,
    pub physical_address: Option<String>,
    pub id_type: Option<String>,
    pub id_number: Option<String>,
    pub university_name: Option<String>,
    pub campus: Option<String>,
    pub student_id: Option<String>,
    pub course: Option<String>,
    pub year_of_study: Option<String>,
    pub university_email: Option<String>,
    pub terms_accepted: Option<String>,
    pub id_document: Option<DocumentUpload>,
    pub student_id_document: Option<DocumentUpload>,
}

/// Fully validated submission, ready to persist
#[derive(Debug)]
pub struct ValidatedApplication {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub phone_number: String,
    pub physical_address: String,
    pub id_type: String,
    pub id_number: String,
    pub university_name: String,
    pub campus: String,
    pub student_id: String,
    pub course: String,
    pub year_of_study: String,
    pub university_email: String,
    pub id_document: DocumentUpload,
    pub student_id_document: DocumentUpload,
}

impl SubmitApplicationForm {
    /// Assign a text field by its multipart name. Returns false for names
    /// this form does not know, so the handler can skip them.
    pub fn set_text_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "full_name" => &mut self.full_name,
            "date_of_birth" => &mut self.date_of_birth,
            "phone_number" => &mut self.phone_number,
            "physical_address" => &mut self.physical_address,
            "id_type" => &mut self.id_type,
            "id_number" => &mut self.id_number,
            "university_name" => &mut self.university_name,
            "campus" => &mut self.campus,
            "student_id" => &mut self.student_id,
            "course" => &mut self.course,
            "year_of_study" => &mut self.year_of_study,
            "university_email" => &mut self.university_email,
            "terms_accepted" => &mut self.terms_accepted,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Validate every field, collecting all failures rather than stopping at
    /// the first. `today` anchors the date-of-birth check.
    pub fn validate(self, today: NaiveDate) -> Result<ValidatedApplication, FieldErrors> {
        let mut errors = FieldErrors::new();

        let full_name = required_string(&mut errors, "full_name", self.full_name, 255);
        let physical_address =
            required_string(&mut errors, "physical_address", self.physical_address, 500);
        let id_number = required_string(&mut errors, "id_number", self.id_number, 50);
        let university_name =
            required_string(&mut errors, "university_name", self.university_name, 255);
        let campus = required_string(&mut errors, "campus", self.campus, 255);
        let student_id = required_string(&mut errors, "student_id", self.student_id, 100);
        let course = required_string(&mut errors, "course", self.course, 255);

        let date_of_birth = match self.date_of_birth.as_deref().map(str::trim) {
            None | Some("") => {
                push_error(&mut errors, "date_of_birth", "The date of birth is required.");
                None
            }
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) if date < today => Some(date),
                Ok(_) => {
                    push_error(
                        &mut errors,
                        "date_of_birth",
                        "The date of birth must be in the past.",
                    );
                    None
                }
                Err(_) => {
                    push_error(
                        &mut errors,
                        "date_of_birth",
                        "The date of birth must be a valid date (YYYY-MM-DD).",
                    );
                    None
                }
            },
        };

        let phone_number = match self.phone_number.as_deref().map(str::trim) {
            None | Some("") => {
                push_error(&mut errors, "phone_number", "The phone number is required.");
                None
            }
            Some(raw) if PHONE_RE.is_match(raw) => Some(raw.to_string()),
            Some(_) => {
                push_error(
                    &mut errors,
                    "phone_number",
                    "The phone number format is invalid.",
                );
                None
            }
        };

        let id_type = enumerated(&mut errors, "id_type", self.id_type, &ID_TYPES);
        let year_of_study = enumerated(
            &mut errors,
            "year_of_study",
            self.year_of_study,
            &YEARS_OF_STUDY,
        );

        let university_email = match self.university_email.as_deref().map(str::trim) {
            None | Some("") => {
                push_error(
                    &mut errors,
                    "university_email",
                    "The university email is required.",
                );
                None
            }
            Some(raw) if EMAIL_RE.is_match(raw) => Some(raw.to_string()),
            Some(_) => {
                push_error(
                    &mut errors,
                    "university_email",
                    "The university email must be a valid email address.",
                );
                None
            }
        };

        match self.terms_accepted.as_deref().map(str::trim) {
            Some("true") | Some("1") | Some("on") | Some("yes") => {}
            _ => push_error(
                &mut errors,
                "terms_accepted",
                "The terms and conditions must be accepted.",
            ),
        }

        let id_document = required_document(&mut errors, "id_document", self.id_document);
        let student_id_document = required_document(
            &mut errors,
            "student_id_document",
            self.student_id_document,
        );

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ValidatedApplication {
            full_name: full_name.unwrap(),
            date_of_birth: date_of_birth.unwrap(),
            phone_number: phone_number.unwrap(),
            physical_address: physical_address.unwrap(),
            id_type: id_type.unwrap(),
            id_number: id_number.unwrap(),
            university_name: university_name.unwrap(),
            campus: campus.unwrap(),
            student_id: student_id.unwrap(),
            course: course.unwrap(),
            year_of_study: year_of_study.unwrap(),
            university_email: university_email.unwrap(),
            id_document: id_document.unwrap(),
            student_id_document: student_id_document.unwrap(),
        })
    }
}

fn push_error(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

fn required_string(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max_len: usize,
) -> Option<String> {
    match value.as_deref().map(str::trim) {
        None | Some("") => {
            push_error(errors, field, &format!("The {} field is required.", field));
            None
        }
        Some(raw) if raw.chars().count() > max_len => {
            push_error(
                errors,
                field,
                &format!("The {} may not be greater than {} characters.", field, max_len),
            );
            None
        }
        Some(raw) => Some(raw.to_string()),
    }
}

fn enumerated(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    allowed: &[&str],
) -> Option<String> {
    match value.as_deref().map(str::trim) {
        None | Some("") => {
            push_error(errors, field, &format!("The {} field is required.", field));
            None
        }
        Some(raw) if allowed.contains(&raw) => Some(raw.to_string()),
        Some(_) => {
            push_error(errors, field, &format!("The selected {} is invalid.", field));
            None
        }
    }
}

fn required_document(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<DocumentUpload>,
) -> Option<DocumentUpload> {
    match value {
        None => {
            push_error(errors, field, &format!("The {} file is required.", field));
            None
        }
        Some(upload) => match upload.validate() {
            Ok(()) => Some(upload),
            Err(message) => {
                push_error(errors, field, &message);
                None
            }
        },
    }
}

/// GET /api/agent-application/status response
#[derive(Debug, Serialize)]
pub struct ApplicationStatusResponse {
    pub has_application: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<ApplicationStatusEntry>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationStatusEntry {
    pub id: i32,
    pub status: ApplicationStatus,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

/// POST /api/agent-application/submit success response
#[derive(Debug, Serialize)]
pub struct SubmitApplicationResponse {
    pub message: String,
    pub application_id: i32,
    pub status: ApplicationStatus,
}
