pub mod admin_applications;
pub mod agent_application;
pub mod agent_dashboard;
pub mod auth;
