//! Query executor tests against SQLite.

use super::memory_connection;
use pretty_assertions::assert_eq;
use querydesk::db::Value;
use querydesk::query::{QueryExecutor, QueryResult};

async fn run(executor: &mut QueryExecutor<'_>, sql: &str) -> QueryResult {
    let result = executor.execute(sql).await;
    assert!(result.is_success(), "{sql}: {:?}", result.error_message());
    result
}

#[tokio::test]
async fn test_select_one() {
    let mut conn = memory_connection(1).await;
    let mut executor = QueryExecutor::new(&mut conn);

    let result = run(&mut executor, "SELECT 1").await;

    assert_eq!(result.columns().map(|c| c.len()), Some(1));
    assert_eq!(result.rows(), Some(&[vec![Value::Int(1)]][..]));
    assert_eq!(result.row_count(), 1);
}

#[tokio::test]
async fn test_update_without_matches_reports_zero() {
    let mut conn = memory_connection(1).await;
    let mut executor = QueryExecutor::new(&mut conn);

    run(&mut executor, "CREATE TABLE t (x INTEGER)").await;
    let result = run(&mut executor, "UPDATE t SET x=1 WHERE 1=0").await;

    assert_eq!(result.columns(), Some(&["Rows Affected".to_string()][..]));
    assert_eq!(result.rows(), Some(&[vec![Value::Int(0)]][..]));
}

#[tokio::test]
async fn test_insert_select_delete_cycle() {
    let mut conn = memory_connection(1).await;
    let mut executor = QueryExecutor::new(&mut conn);

    run(
        &mut executor,
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, score REAL, avatar BLOB)",
    )
    .await;
    let inserted = run(
        &mut executor,
        "INSERT INTO users (name, score, avatar) VALUES ('ada', 9.5, x'0102'), ('bob', NULL, NULL)",
    )
    .await;
    assert_eq!(inserted.rows(), Some(&[vec![Value::Int(2)]][..]));

    let selected = run(
        &mut executor,
        "select id, name, score, avatar from users order by id",
    )
    .await;
    assert_eq!(
        selected.columns(),
        Some(
            &[
                "id".to_string(),
                "name".to_string(),
                "score".to_string(),
                "avatar".to_string()
            ][..]
        )
    );
    assert_eq!(
        selected.rows(),
        Some(
            &[
                vec![
                    Value::Int(1),
                    Value::String("ada".to_string()),
                    Value::Float(9.5),
                    Value::Bytes(vec![1, 2]),
                ],
                vec![
                    Value::Int(2),
                    Value::String("bob".to_string()),
                    Value::Null,
                    Value::Null,
                ],
            ][..]
        )
    );

    let deleted = run(&mut executor, "DELETE FROM users WHERE score IS NULL").await;
    assert_eq!(deleted.rows(), Some(&[vec![Value::Int(1)]][..]));
}

#[tokio::test]
async fn test_empty_result_keeps_columns() {
    let mut conn = memory_connection(1).await;
    let mut executor = QueryExecutor::new(&mut conn);

    run(&mut executor, "CREATE TABLE t (a INTEGER, b TEXT)").await;
    let result = run(&mut executor, "SELECT a, b FROM t").await;

    assert_eq!(result.columns(), Some(&["a".to_string(), "b".to_string()][..]));
    assert_eq!(result.row_count(), 0);
}

#[tokio::test]
async fn test_duplicate_column_names() {
    let mut conn = memory_connection(1).await;
    let mut executor = QueryExecutor::new(&mut conn);

    let result = run(&mut executor, "SELECT 1 AS a, 2 AS a").await;

    assert_eq!(result.columns(), Some(&["a".to_string(), "a".to_string()][..]));
    assert_eq!(result.rows(), Some(&[vec![Value::Int(1), Value::Int(2)]][..]));
}

#[tokio::test]
async fn test_comments_are_stripped() {
    let mut conn = memory_connection(1).await;
    let mut executor = QueryExecutor::new(&mut conn);

    let sql = "SELECT /* the answer */ 42 AS answer -- trailing note";
    let result = run(&mut executor, sql).await;

    assert_eq!(result.sql(), sql);
    assert_eq!(result.rows(), Some(&[vec![Value::Int(42)]][..]));
}

#[tokio::test]
async fn test_rejected_statements() {
    let mut conn = memory_connection(1).await;
    let mut executor = QueryExecutor::new(&mut conn);

    for sql in ["", "  ", "PRAGMA table_info(t)", "SELECT(1)", "SELECTOR x"] {
        let result = executor.execute(sql).await;
        assert_eq!(result.error_message(), Some("Invalid SQL query"), "{sql:?}");
    }
}

#[tokio::test]
async fn test_driver_error_is_a_failure() {
    let mut conn = memory_connection(1).await;
    let mut executor = QueryExecutor::new(&mut conn);

    let missing = executor.execute("SELECT * FROM missing_table").await;
    let message = missing.error_message().unwrap();
    assert!(message.starts_with("Database error:"), "{message}");
    assert!(message.contains("missing_table"), "{message}");

    let syntax = executor.execute("DELETE FROM WHERE").await;
    assert!(!syntax.is_success());

    // The connection stays usable after a failure.
    run(&mut executor, "SELECT 1").await;
}

#[tokio::test]
async fn test_parameterized_statements() {
    let mut conn = memory_connection(1).await;
    let mut executor = QueryExecutor::new(&mut conn);

    run(&mut executor, "CREATE TABLE kv (k TEXT, v INTEGER)").await;

    let insert = executor
        .execute_parameterized(
            "INSERT INTO kv (k, v) VALUES (?, ?)",
            &[Value::from("a"), Value::Int(1)],
        )
        .await;
    assert_eq!(insert.rows(), Some(&[vec![Value::Int(1)]][..]));

    executor
        .execute_parameterized(
            "INSERT INTO kv (k, v) VALUES (?, ?)",
            &[Value::from("b"), Value::Null],
        )
        .await;

    let select = executor
        .execute_parameterized("SELECT v FROM kv WHERE k = ?", &[Value::from("b")])
        .await;
    assert_eq!(select.rows(), Some(&[vec![Value::Null]][..]));
}

#[tokio::test]
async fn test_closed_connection_is_not_valid() {
    let mut conn = memory_connection(1).await;
    conn.close().await.unwrap();
    let mut executor = QueryExecutor::new(&mut conn);

    let result = executor.execute("SELECT 1").await;
    assert!(result.error_message().unwrap().contains("not valid"));

    let result = executor
        .execute_parameterized("SELECT ?", &[Value::Int(1)])
        .await;
    assert!(result.error_message().unwrap().contains("not valid"));
}
