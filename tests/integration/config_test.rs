//! Config file to open connection, end to end.

use pretty_assertions::assert_eq;
use querydesk::config::Config;
use querydesk::connection;
use querydesk::db::DriverKind;
use querydesk::error::QueryDeskError;
use querydesk::history::HistoryTracker;
use querydesk::session::Session;

#[tokio::test]
async fn test_profile_from_file_opens_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("local.db");
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[history]
max_entries = 2

[connections.local]
id = 11
url = "sqlite://{}"
username = "me"
"#,
            db_path.display()
        ),
    )
    .unwrap();

    let config = Config::load_from_file(&config_path).unwrap();
    let profile = config.get_connection(Some("local")).cloned().unwrap();
    let connection_config = profile.into_config("local").unwrap();
    assert_eq!(connection_config.driver(), "sqlite");

    let conn = connection::open(connection_config).await.unwrap();
    assert_eq!(conn.driver(), Some(DriverKind::Sqlite));
    assert_eq!(conn.conn_id(), 11);

    let session = Session::spawn(
        conn,
        HistoryTracker::with_max_entries(config.history.max_entries),
    );
    session.execute("CREATE TABLE t (x INTEGER)").await.unwrap();
    session.execute("INSERT INTO t VALUES (1)").await.unwrap();
    session.execute("SELECT x FROM t").await.unwrap();

    let history = session.history().await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|e| e.conn_id == 11));
    session.close().await.unwrap();

    assert!(db_path.exists());
}

#[tokio::test]
async fn test_profile_with_unregistered_driver() {
    let config: Config = toml::from_str(
        r#"
[connections.legacy]
url = "jdbc:oracle:thin:@host:1521:orcl"
username = "scott"
driver = "oracle.jdbc.OracleDriver"
"#,
    )
    .unwrap();

    let profile = config.get_connection(Some("legacy")).cloned().unwrap();
    let err = connection::open(profile.into_config("legacy").unwrap())
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Database driver not found: oracle.jdbc.OracleDriver"
    );
    assert!(matches!(err, QueryDeskError::DriverNotFound(_)));
}
