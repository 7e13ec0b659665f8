use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::env;

/// Set up the integration test database connection and run migrations.
///
/// Returns None when TEST_DATABASE_URL is unset so database-backed suites
/// skip cleanly on machines without Postgres instead of failing.
#[allow(dead_code)]
pub async fn setup_test_db() -> Option<DatabaseConnection> {
    let Ok(database_url) = env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping database-backed test");
        return None;
    };

    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");

    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    Some(db)
}
