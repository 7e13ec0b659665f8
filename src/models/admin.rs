//! Admin review request/response models
//!
//! Models for the admin application-review endpoints: filtered listing with
//! stats and facets, full detail, and the approve/reject payloads.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::agent_applications::{self, ApplicationStatus};
use crate::entities::{agents, users};

/// Query parameters for the application listing
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationListQuery {
    /// Case-insensitive match on applicant name, student ID, university
    /// email, or account email
    pub search: Option<String>,
    /// Exact status filter; "all" (or absent) disables it
    pub status: Option<String>,
    /// Exact university filter; "all" (or absent) disables it
    pub university: Option<String>,
    /// 1-based page (default: 1)
    pub page: Option<u64>,
    /// Page size (default: 15, max: 100)
    pub per_page: Option<u64>,
}

impl ApplicationListQuery {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(page) = self.page {
            if page < 1 {
                return Err("page must be at least 1".to_string());
            }
        }
        if let Some(per_page) = self.per_page {
            if per_page < 1 {
                return Err("per_page must be at least 1".to_string());
            }
            if per_page > 100 {
                return Err("per_page cannot exceed 100".to_string());
            }
        }
        if self.status_filter().is_err() {
            return Err("status must be one of all, pending, approved, rejected".to_string());
        }
        Ok(())
    }

    /// Parsed status filter; `Ok(None)` when the sentinel "all" (or nothing)
    /// was supplied
    pub fn status_filter(&self) -> Result<Option<ApplicationStatus>, ()> {
        match self.status.as_deref() {
            None | Some("") | Some("all") => Ok(None),
            Some("pending") => Ok(Some(ApplicationStatus::Pending)),
            Some("approved") => Ok(Some(ApplicationStatus::Approved)),
            Some("rejected") => Ok(Some(ApplicationStatus::Rejected)),
            Some(_) => Err(()),
        }
    }

    /// University filter with the "all" sentinel stripped
    pub fn university_filter(&self) -> Option<&str> {
        match self.university.as_deref() {
            None | Some("") | Some("all") => None,
            Some(university) => Some(university),
        }
    }

    pub fn page_or_default(&self) -> u64 {
        self.page.unwrap_or(1)
    }

    pub fn per_page_or_default(&self) -> u64 {
        self.per_page.unwrap_or(15)
    }
}

/// Applicant (or reviewer) identity attached to listing and detail payloads
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<users::Model> for UserInfo {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// One row of the admin listing
#[derive(Debug, Serialize)]
pub struct ApplicationListItem {
    pub id: i32,
    pub full_name: String,
    pub university_name: String,
    pub campus: String,
    pub student_id: String,
    pub course: String,
    pub year_of_study: String,
    pub university_email: String,
    pub status: ApplicationStatus,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant: Option<UserInfo>,
}

/// Aggregate counts by status, always unfiltered
#[derive(Debug, Serialize)]
pub struct ApplicationStats {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

/// GET /api/admin/agent-applications/list response
#[derive(Debug, Serialize)]
pub struct ApplicationListResponse {
    pub applications: Vec<ApplicationListItem>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
    pub stats: ApplicationStats,
    /// Distinct university names observed, for filter population
    pub universities: Vec<String>,
}

/// Agent record attached to an approved application's detail payload
#[derive(Debug, Serialize)]
pub struct AgentInfo {
    pub id: i32,
    pub agent_code: String,
    pub commission_rate: Decimal,
    pub is_active: bool,
}

impl From<agents::Model> for AgentInfo {
    fn from(agent: agents::Model) -> Self {
        Self {
            id: agent.id,
            agent_code: agent.agent_code,
            commission_rate: agent.commission_rate,
            is_active: agent.is_active,
        }
    }
}

/// Full application detail with its joined collaborators
#[derive(Debug, Serialize)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: agent_applications::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant: Option<UserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<UserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentInfo>,
}

/// GET /api/admin/agent-applications/{id} response
#[derive(Debug, Serialize)]
pub struct ApplicationDetailResponse {
    pub application: ApplicationDetail,
}

/// POST .../approve request body
#[derive(Debug, Deserialize)]
pub struct ApproveApplicationRequest {
    /// Override for the default 10.00 commission rate, percent in [0, 100]
    pub commission_rate: Option<Decimal>,
}

/// POST .../reject request body
#[derive(Debug, Deserialize)]
pub struct RejectApplicationRequest {
    pub rejection_reason: String,
}

/// Successful approve/reject response
#[derive(Debug, Serialize)]
pub struct ReviewActionResponse {
    pub message: String,
    pub application: ApplicationDetail,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(status: Option<&str>, page: Option<u64>, per_page: Option<u64>) -> ApplicationListQuery {
        ApplicationListQuery {
            search: None,
            status: status.map(str::to_string),
            university: None,
            page,
            per_page,
        }
    }

    #[test]
    fn default_paging() {
        let q = query(None, None, None);
        assert!(q.validate().is_ok());
        assert_eq!(q.page_or_default(), 1);
        assert_eq!(q.per_page_or_default(), 15);
    }

    #[test]
    fn per_page_capped_at_100() {
        assert!(query(None, None, Some(100)).validate().is_ok());
        assert!(query(None, None, Some(101)).validate().is_err());
        assert!(query(None, None, Some(0)).validate().is_err());
    }

    #[test]
    fn all_sentinel_disables_status_filter() {
        assert_eq!(query(Some("all"), None, None).status_filter(), Ok(None));
        assert_eq!(
            query(Some("pending"), None, None).status_filter(),
            Ok(Some(ApplicationStatus::Pending))
        );
        assert!(query(Some("bogus"), None, None).validate().is_err());
    }

    #[test]
    fn all_sentinel_disables_university_filter() {
        let mut q = query(None, None, None);
        q.university = Some("all".to_string());
        assert_eq!(q.university_filter(), None);
        q.university = Some("University of Nairobi".to_string());
        assert_eq!(q.university_filter(), Some("University of Nairobi"));
    }
}
