//! PostgreSQL tests.
//!
//! These tests require a running PostgreSQL database.
//! Set DATABASE_URL environment variable to run them.

use pretty_assertions::assert_eq;
use querydesk::config::ConnectionConfig;
use querydesk::connection::{self, Connection};
use querydesk::db::Value;
use querydesk::query::QueryExecutor;

/// Opens a connection to DATABASE_URL, taking credentials from the URL when present.
async fn get_test_connection() -> Option<Connection> {
    let raw = std::env::var("DATABASE_URL").ok()?;
    let parsed = url::Url::parse(&raw).ok()?;

    let username = match parsed.username() {
        "" => std::env::var("QUERYDESK_USER").unwrap_or_else(|_| "postgres".to_string()),
        user => user.to_string(),
    };
    let password = parsed
        .password()
        .map(str::to_string)
        .or_else(|| std::env::var("QUERYDESK_PASSWORD").ok())
        .unwrap_or_default();

    let config = ConnectionConfig::new(1, "pg", raw, username, password, "org.postgresql.Driver")
        .ok()?;
    connection::open(config).await.ok()
}

#[tokio::test]
async fn test_select_one() {
    let Some(mut conn) = get_test_connection().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = QueryExecutor::new(&mut conn).execute("SELECT 1").await;

    assert_eq!(result.rows(), Some(&[vec![Value::Int(1)]][..]));
    assert_eq!(result.row_count(), 1);
    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_types_and_nulls() {
    let Some(mut conn) = get_test_connection().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = QueryExecutor::new(&mut conn)
        .execute("SELECT 1::int4 AS a, 'x'::text AS b, NULL::int8 AS c, true AS d")
        .await;

    assert_eq!(
        result.rows(),
        Some(
            &[vec![
                Value::Int(1),
                Value::String("x".to_string()),
                Value::Null,
                Value::Bool(true),
            ]][..]
        )
    );
    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_mutation_in_temp_table() {
    let Some(mut conn) = get_test_connection().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let mut executor = QueryExecutor::new(&mut conn);

    let created = executor
        .execute("CREATE TEMP TABLE querydesk_t (x int)")
        .await;
    assert!(created.is_success(), "{:?}", created.error_message());

    let updated = executor.execute("UPDATE querydesk_t SET x=1 WHERE 1=0").await;
    assert_eq!(updated.rows(), Some(&[vec![Value::Int(0)]][..]));

    let inserted = executor
        .execute_parameterized(
            "INSERT INTO querydesk_t (x) VALUES ($1), ($2)",
            &[Value::Int(1), Value::Int(2)],
        )
        .await;
    assert_eq!(inserted.rows(), Some(&[vec![Value::Int(2)]][..]));

    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_error_message_from_server() {
    let Some(mut conn) = get_test_connection().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = QueryExecutor::new(&mut conn)
        .execute("SELECT * FROM querydesk_missing_table")
        .await;

    let message = result.error_message().unwrap();
    assert!(message.starts_with("Database error:"), "{message}");
    assert!(message.contains("querydesk_missing_table"), "{message}");
    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_mutation_runs_a_single_statement() {
    let Some(mut conn) = get_test_connection().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let mut executor = QueryExecutor::new(&mut conn);

    let created = executor
        .execute("CREATE TEMP TABLE querydesk_single (x int)")
        .await;
    assert!(created.is_success(), "{:?}", created.error_message());

    let script = executor
        .execute("INSERT INTO querydesk_single VALUES (1); DROP TABLE querydesk_single")
        .await;
    let message = script.error_message().unwrap();
    assert!(message.starts_with("Database error:"), "{message}");

    // Neither statement of the script ran.
    let remaining = executor.execute("SELECT count(*) FROM querydesk_single").await;
    assert_eq!(remaining.rows(), Some(&[vec![Value::Int(0)]][..]));

    conn.close().await.unwrap();
}
