//! End-to-end tests for the agent program: submission, review transitions,
//! tier standing, and document handling against a real Postgres instance.
//!
//! Suites skip when TEST_DATABASE_URL is unset.

mod common;

use axum::{
    Router,
    http::{HeaderName, HeaderValue},
    routing::{get, post},
};
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde_json::{Value, json};
use uuid::Uuid;

use unimarket_backend::entities::agent_applications::{self, ApplicationStatus};
use unimarket_backend::entities::orders::OrderStatus;
use unimarket_backend::entities::prelude::*;
use unimarket_backend::entities::users::UserRole;
use unimarket_backend::entities::{agents, orders, users};
use unimarket_backend::services::documents::DocumentStore;
use unimarket_backend::services::review::{self, ReviewError};
use unimarket_backend::{AppState, handlers};

use crate::common::setup_test_db;

fn build_server(db: DatabaseConnection, storage_root: &std::path::Path) -> TestServer {
    let state = AppState {
        db,
        documents: DocumentStore::new(storage_root),
        debug: true,
    };

    let router = Router::new()
        .route(
            "/api/agent-application/status",
            get(handlers::agent_application::get_application_status),
        )
        .route(
            "/api/agent-application/submit",
            post(handlers::agent_application::submit_application),
        )
        .route(
            "/api/admin/agent-applications/list",
            get(handlers::admin_applications::list_applications),
        )
        .route(
            "/api/admin/agent-applications/{id}",
            get(handlers::admin_applications::show_application),
        )
        .route(
            "/api/admin/agent-applications/{id}/approve",
            post(handlers::admin_applications::approve_application),
        )
        .route(
            "/api/admin/agent-applications/{id}/reject",
            post(handlers::admin_applications::reject_application),
        )
        .route(
            "/api/admin/agent-applications/{id}/documents/{kind}",
            get(handlers::admin_applications::download_document),
        )
        .route(
            "/api/agent/dashboard-ui",
            get(handlers::agent_dashboard::get_dashboard),
        )
        .with_state(state);

    TestServer::new(router).expect("failed to build test server")
}

fn identity(user_id: i32) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(&user_id.to_string()).unwrap(),
    )
}

async fn create_user(db: &DatabaseConnection, role: UserRole) -> users::Model {
    users::ActiveModel {
        name: Set("Test Account".to_string()),
        email: Set(format!("account-{}@test.example", Uuid::new_v4().simple())),
        role: Set(role),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to insert user")
}

async fn insert_pending_application(
    db: &DatabaseConnection,
    user_id: i32,
    university: &str,
) -> agent_applications::Model {
    let suffix = Uuid::new_v4().simple().to_string();
    agent_applications::ActiveModel {
        user_id: Set(user_id),
        full_name: Set("Test Applicant".to_string()),
        date_of_birth: Set(NaiveDate::from_ymd_opt(2002, 1, 1).unwrap()),
        phone_number: Set("0712345678".to_string()),
        physical_address: Set("Hostel B, Room 12".to_string()),
        id_type: Set("National ID".to_string()),
        id_number: Set("34567890".to_string()),
        id_document_path: Set(format!("agent-applications/id-documents/{}.pdf", suffix)),
        university_name: Set(university.to_string()),
        campus: Set("Main Campus".to_string()),
        student_id: Set(format!("STU-{}", &suffix[..8])),
        course: Set("BSc Computer Science".to_string()),
        year_of_study: Set("Year 3".to_string()),
        university_email: Set(format!("{}@students.test.ac.ke", &suffix[..8])),
        student_id_document_path: Set(format!("agent-applications/student-ids/{}.pdf", suffix)),
        status: Set(ApplicationStatus::Pending),
        terms_accepted: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to insert application")
}

async fn insert_order(
    db: &DatabaseConnection,
    customer_id: i32,
    agent_id: i32,
    amount: rust_decimal::Decimal,
    status: OrderStatus,
) -> orders::Model {
    orders::ActiveModel {
        user_id: Set(customer_id),
        agent_id: Set(Some(agent_id)),
        order_reference: Set(format!("ORD-{}", Uuid::new_v4().simple())),
        full_name: Set("Order Customer".to_string()),
        email: Set(format!("customer-{}@test.example", Uuid::new_v4().simple())),
        phone: Set("0712000000".to_string()),
        total_amount: Set(amount),
        currency: Set("KES".to_string()),
        status: Set(status),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to insert order")
}

fn application_form(phone: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("full_name", "Jane Wanjiku")
        .add_text("date_of_birth", "2003-04-12")
        .add_text("phone_number", phone)
        .add_text("physical_address", "Hostel B, Room 12")
        .add_text("id_type", "National ID")
        .add_text("id_number", "34567890")
        .add_text("university_name", "University of Nairobi")
        .add_text("campus", "Main Campus")
        .add_text("student_id", "UON/2021/1234")
        .add_text("course", "BSc Computer Science")
        .add_text("year_of_study", "Year 3")
        .add_text("university_email", "jane@students.uonbi.ac.ke")
        .add_text("terms_accepted", "true")
        .add_part(
            "id_document",
            Part::bytes(b"%PDF-1.4 id document".to_vec())
                .file_name("id.pdf")
                .mime_type("application/pdf"),
        )
        .add_part(
            "student_id_document",
            Part::bytes(b"%PDF-1.4 student id".to_vec())
                .file_name("student.pdf")
                .mime_type("application/pdf"),
        )
}

#[tokio::test]
async fn submit_succeeds_once_then_conflicts() {
    let Some(db) = setup_test_db().await else { return };
    let storage = tempfile::tempdir().unwrap();
    let server = build_server(db.clone(), storage.path());
    let applicant = create_user(&db, UserRole::User).await;

    let (name, value) = identity(applicant.id);
    let response = server
        .post("/api/agent-application/submit")
        .add_header(name, value)
        .multipart(application_form("0712345678"))
        .await;

    assert_eq!(response.status_code(), 201);
    let body: Value = response.json();
    assert_eq!(body["status"], "pending");
    let application_id = body["application_id"].as_i64().unwrap();
    assert!(application_id > 0);

    // Both documents must exist on disk under their namespaces
    let stored = AgentApplications::find_by_id(application_id as i32)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(storage.path().join(&stored.id_document_path).exists());
    assert!(storage.path().join(&stored.student_id_document_path).exists());

    // Second submission while pending: conflict
    let (name, value) = identity(applicant.id);
    let response = server
        .post("/api/agent-application/submit")
        .add_header(name, value)
        .multipart(application_form("0712345678"))
        .await;

    assert_eq!(response.status_code(), 422);
    let body: Value = response.json();
    assert_eq!(body["error"], "You already have a pending application.");
}

#[tokio::test]
async fn submit_with_invalid_phone_is_rejected_without_side_effects() {
    let Some(db) = setup_test_db().await else { return };
    let storage = tempfile::tempdir().unwrap();
    let server = build_server(db.clone(), storage.path());
    let applicant = create_user(&db, UserRole::User).await;

    let (name, value) = identity(applicant.id);
    let response = server
        .post("/api/agent-application/submit")
        .add_header(name, value)
        .multipart(application_form("0812345678"))
        .await;

    assert_eq!(response.status_code(), 422);
    let body: Value = response.json();
    assert!(body["errors"]["phone_number"].is_array());

    // No record and no stored documents
    let count = AgentApplications::find()
        .filter(agent_applications::Column::UserId.eq(applicant.id))
        .all(&db)
        .await
        .unwrap()
        .len();
    assert_eq!(count, 0);
    assert!(
        !storage
            .path()
            .join("agent-applications/id-documents")
            .exists()
    );
}

#[tokio::test]
async fn approve_then_show_reflects_agent_and_promoted_role() {
    let Some(db) = setup_test_db().await else { return };
    let storage = tempfile::tempdir().unwrap();
    let server = build_server(db.clone(), storage.path());

    let applicant = create_user(&db, UserRole::User).await;
    let admin = create_user(&db, UserRole::Admin).await;
    let application = insert_pending_application(&db, applicant.id, "Approve U").await;

    let (name, value) = identity(admin.id);
    let response = server
        .post(&format!(
            "/api/admin/agent-applications/{}/approve",
            application.id
        ))
        .add_header(name, value)
        .json(&json!({ "commission_rate": 12.5 }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["message"], "Application approved successfully.");
    assert_eq!(body["application"]["status"], "approved");

    // Round trip through show
    let (name, value) = identity(admin.id);
    let response = server
        .get(&format!("/api/admin/agent-applications/{}", application.id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let detail = &body["application"];
    assert_eq!(detail["status"], "approved");
    let rate: f64 = detail["agent"]["commission_rate"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(rate, 12.5);
    assert_eq!(detail["reviewer"]["id"].as_i64().unwrap(), admin.id as i64);

    // Role promotion committed with the same transaction
    let promoted = Users::find_by_id(applicant.id).one(&db).await.unwrap().unwrap();
    assert_eq!(promoted.role, UserRole::Agent);

    // A second approval attempt is a state error
    let (name, value) = identity(admin.id);
    let response = server
        .post(&format!(
            "/api/admin/agent-applications/{}/approve",
            application.id
        ))
        .add_header(name, value)
        .json(&json!({}))
        .await;
    assert_eq!(response.status_code(), 422);
    let body: Value = response.json();
    assert_eq!(body["error"], "Only pending applications can be approved.");
}

#[tokio::test]
async fn reject_validates_reason_and_allows_reapplication() {
    let Some(db) = setup_test_db().await else { return };
    let storage = tempfile::tempdir().unwrap();
    let server = build_server(db.clone(), storage.path());

    let applicant = create_user(&db, UserRole::User).await;
    let admin = create_user(&db, UserRole::Admin).await;
    let application = insert_pending_application(&db, applicant.id, "Reject U").await;

    // Too-short reason
    let (name, value) = identity(admin.id);
    let response = server
        .post(&format!(
            "/api/admin/agent-applications/{}/reject",
            application.id
        ))
        .add_header(name, value)
        .json(&json!({ "rejection_reason": "nope!" }))
        .await;
    assert_eq!(response.status_code(), 422);
    let body: Value = response.json();
    assert!(body["errors"]["rejection_reason"].is_array());

    // Proper reason
    let reason = "Student ID document is illegible, please re-upload a clear scan.";
    let (name, value) = identity(admin.id);
    let response = server
        .post(&format!(
            "/api/admin/agent-applications/{}/reject",
            application.id
        ))
        .add_header(name, value)
        .json(&json!({ "rejection_reason": reason }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["application"]["status"], "rejected");
    assert_eq!(body["application"]["rejection_reason"], reason);

    // The applicant sees the reason on the status endpoint
    let (name, value) = identity(applicant.id);
    let response = server
        .get("/api/agent-application/status")
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["has_application"], true);
    assert_eq!(body["application"]["status"], "rejected");
    assert_eq!(body["application"]["rejection_reason"], reason);

    // A rejected application does not block reapplying; the old row stays
    let (name, value) = identity(applicant.id);
    let response = server
        .post("/api/agent-application/submit")
        .add_header(name, value)
        .multipart(application_form("0712345678"))
        .await;
    assert_eq!(response.status_code(), 201);

    let rows = AgentApplications::find()
        .filter(agent_applications::Column::UserId.eq(applicant.id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn concurrent_approvals_create_exactly_one_agent() {
    let Some(db) = setup_test_db().await else { return };

    let applicant = create_user(&db, UserRole::User).await;
    let admin = create_user(&db, UserRole::Admin).await;
    let application = insert_pending_application(&db, applicant.id, "Race U").await;

    let first = review::approve_application(&db, application.id, admin.id, None);
    let second = review::approve_application(&db, application.id, admin.id, Some(dec!(15)));
    let (first, second) = tokio::join!(first, second);

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one approval must win");

    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(
        loser,
        Err(ReviewError::NotPending) | Err(ReviewError::AgentExists)
    ));

    let agents_created = Agents::find()
        .filter(agents::Column::ApplicationId.eq(application.id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(agents_created.len(), 1);
}

#[tokio::test]
async fn dashboard_with_zero_orders_is_bronze() {
    let Some(db) = setup_test_db().await else { return };
    let storage = tempfile::tempdir().unwrap();
    let server = build_server(db.clone(), storage.path());

    let applicant = create_user(&db, UserRole::User).await;
    let admin = create_user(&db, UserRole::Admin).await;
    let application = insert_pending_application(&db, applicant.id, "Dashboard U").await;
    review::approve_application(&db, application.id, admin.id, None)
        .await
        .expect("approval should succeed");

    let (name, value) = identity(applicant.id);
    let response = server
        .get("/api/agent/dashboard-ui")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["tier_info"]["name"], "bronze");
    assert_eq!(body["tier_info"]["current_sales"], 0.0);
    assert_eq!(body["tier_info"]["sales_to_next_tier"], 25000.0);
    assert_eq!(body["stats"]["current_tier"], "bronze");
    assert_eq!(body["stats"]["customers_count"], 0);
    assert_eq!(body["quarterly_data"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn boundary_sales_total_promotes_and_cancelled_orders_are_excluded() {
    let Some(db) = setup_test_db().await else { return };
    let storage = tempfile::tempdir().unwrap();
    let server = build_server(db.clone(), storage.path());

    let applicant = create_user(&db, UserRole::User).await;
    let admin = create_user(&db, UserRole::Admin).await;
    let customer = create_user(&db, UserRole::User).await;
    let application = insert_pending_application(&db, applicant.id, "Boundary U").await;
    let (_, agent) = review::approve_application(&db, application.id, admin.id, None)
        .await
        .expect("approval should succeed");

    // Exactly at the bronze/silver boundary, plus a cancelled order that
    // must not count toward the total
    insert_order(&db, customer.id, agent.id, dec!(25000), OrderStatus::Paid).await;
    insert_order(&db, customer.id, agent.id, dec!(40000), OrderStatus::Cancelled).await;

    let (name, value) = identity(applicant.id);
    let response = server
        .get("/api/agent/dashboard-ui")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["tier_info"]["name"], "silver");
    assert_eq!(body["tier_info"]["commission_rate"], 20.0);
    assert_eq!(body["tier_info"]["current_sales"], 25000.0);
    assert_eq!(body["tier_info"]["sales_to_next_tier"], 25000.0);
    assert_eq!(body["stats"]["customers_count"], 1);
    assert!(!body["recent_sales"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn admin_list_filters_and_facets() {
    let Some(db) = setup_test_db().await else { return };
    let storage = tempfile::tempdir().unwrap();
    let server = build_server(db.clone(), storage.path());

    let admin = create_user(&db, UserRole::Admin).await;
    let first = create_user(&db, UserRole::User).await;
    let second = create_user(&db, UserRole::User).await;

    let university = format!("Facet University {}", Uuid::new_v4().simple());
    let a = insert_pending_application(&db, first.id, &university).await;
    insert_pending_application(&db, second.id, &university).await;

    // University filter narrows to exactly these two
    let (name, value) = identity(admin.id);
    let response = server
        .get("/api/admin/agent-applications/list")
        .add_query_param("university", &university)
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["total"], 2);
    assert!(
        body["universities"]
            .as_array()
            .unwrap()
            .iter()
            .any(|u| u == university.as_str())
    );
    assert!(body["stats"]["pending"].as_u64().unwrap() >= 2);

    // Search by student id narrows to one, case-insensitively
    let (name, value) = identity(admin.id);
    let response = server
        .get("/api/admin/agent-applications/list")
        .add_query_param("search", &a.student_id.to_lowercase())
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["total"], 1);
    assert_eq!(
        body["applications"][0]["id"].as_i64().unwrap(),
        a.id as i64
    );

    // Sentinel "all" disables the status filter, unknown status is a 400
    let (name, value) = identity(admin.id);
    let response = server
        .get("/api/admin/agent-applications/list")
        .add_query_param("status", "bogus")
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), 400);

    // Non-admin callers are refused
    let (name, value) = identity(first.id);
    let response = server
        .get("/api/admin/agent-applications/list")
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn downloading_a_missing_document_is_not_found() {
    let Some(db) = setup_test_db().await else { return };
    let storage = tempfile::tempdir().unwrap();
    let server = build_server(db.clone(), storage.path());

    let applicant = create_user(&db, UserRole::User).await;
    let admin = create_user(&db, UserRole::Admin).await;
    // Paths point at files that were never stored
    let application = insert_pending_application(&db, applicant.id, "Missing Docs U").await;

    let (name, value) = identity(admin.id);
    let response = server
        .get(&format!(
            "/api/admin/agent-applications/{}/documents/id-document",
            application.id
        ))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), 404);

    // Unknown document kinds 404 as well
    let (name, value) = identity(admin.id);
    let response = server
        .get(&format!(
            "/api/admin/agent-applications/{}/documents/passport",
            application.id
        ))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), 404);
}
