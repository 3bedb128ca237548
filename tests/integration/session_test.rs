//! Session and history tests against SQLite.

use super::memory_connection;
use pretty_assertions::assert_eq;
use querydesk::history::HistoryTracker;
use querydesk::session::Session;

#[tokio::test]
async fn test_session_records_every_statement() {
    let session = Session::spawn(memory_connection(42).await, HistoryTracker::new());

    session.execute("CREATE TABLE t (x INTEGER)").await.unwrap();
    session.execute("INSERT INTO t VALUES (1), (2)").await.unwrap();
    session.execute("SELECT x FROM t").await.unwrap();
    session.execute("SELECT * FROM nowhere").await.unwrap();

    let history = session.history().await.unwrap();
    assert_eq!(
        history.iter().map(|e| e.history_id).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );
    assert!(history.iter().all(|e| e.conn_id == 42));

    assert_eq!(history[1].row_count, 1);
    assert_eq!(history[2].row_count, 2);
    assert!(history[2].success);
    assert!(!history[3].success);
    assert_eq!(history[3].row_count, 0);
    assert!(history[3].error_message.contains("nowhere"));

    assert_eq!(session.search("select").await.unwrap().len(), 2);
    assert_eq!(session.for_connection(42).await.unwrap().len(), 4);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_history_cap_through_session() {
    let session = Session::spawn(memory_connection(1).await, HistoryTracker::new());

    for i in 0..105 {
        session.execute(format!("SELECT {i}")).await.unwrap();
    }

    let history = session.history().await.unwrap();
    assert_eq!(history.len(), 100);
    assert_eq!(history[0].sql, "SELECT 5");
    assert_eq!(history[0].history_id, 6);

    session.execute("SELECT 'next'").await.unwrap();
    let recent = session.recent(1).await.unwrap();
    assert_eq!(recent[0].history_id, 106);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_session_with_configured_cap() {
    let session = Session::spawn(
        memory_connection(1).await,
        HistoryTracker::with_max_entries(3),
    );

    for sql in ["SELECT 1", "SELECT 2", "SELECT 3", "SELECT 4"] {
        session.execute(sql).await.unwrap();
    }

    let sqls: Vec<String> = session
        .history()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.sql)
        .collect();
    assert_eq!(sqls, vec!["SELECT 2", "SELECT 3", "SELECT 4"]);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_closed_session_rejects_calls() {
    let session = Session::spawn(memory_connection(1).await, HistoryTracker::new());
    assert!(session.is_valid().await.unwrap());

    session.close().await.unwrap();

    let err = session.history().await.unwrap_err();
    assert_eq!(err.to_string(), "Unexpected error: session closed");
}
