//! Actor owning a connection and its history.
//!
//! The presentation layer talks to a [`SessionHandle`]; commands are queued
//! on an mpsc channel and processed one at a time by the session task, so
//! statement execution and history updates never interleave.

use std::ops::ControlFlow;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::connection::Connection;
use crate::db::Value;
use crate::error::{QueryDeskError, Result};
use crate::history::{HistoryEntry, HistoryTracker};
use crate::query::{QueryExecutor, QueryResult};

const COMMAND_BUFFER: usize = 32;

/// Commands sent from a handle to the session task.
#[derive(Debug)]
enum SessionCommand {
    Execute {
        sql: String,
        reply: oneshot::Sender<QueryResult>,
    },
    ExecuteParameterized {
        sql: String,
        params: Vec<Value>,
        reply: oneshot::Sender<QueryResult>,
    },
    History {
        reply: oneshot::Sender<Vec<HistoryEntry>>,
    },
    Recent {
        n: usize,
        reply: oneshot::Sender<Vec<HistoryEntry>>,
    },
    Search {
        term: String,
        reply: oneshot::Sender<Vec<HistoryEntry>>,
    },
    ForConnection {
        conn_id: i64,
        reply: oneshot::Sender<Vec<HistoryEntry>>,
    },
    Entry {
        history_id: i64,
        reply: oneshot::Sender<Option<HistoryEntry>>,
    },
    ClearHistory {
        reply: oneshot::Sender<()>,
    },
    IsValid {
        reply: oneshot::Sender<bool>,
    },
    Close {
        reply: oneshot::Sender<Result<()>>,
    },
}

/// The session task state.
pub struct Session {
    connection: Connection,
    history: HistoryTracker,
    receiver: mpsc::Receiver<SessionCommand>,
}

impl Session {
    /// Starts the session task and returns a handle to it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(connection: Connection, history: HistoryTracker) -> SessionHandle {
        let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
        let handle = SessionHandle {
            sender,
            conn_id: connection.conn_id(),
            name: connection.config().name().to_string(),
        };

        let session = Self {
            connection,
            history,
            receiver,
        };
        tokio::spawn(session.run());

        handle
    }

    /// Processes commands until `Close` arrives or every handle is dropped.
    async fn run(mut self) {
        while let Some(cmd) = self.receiver.recv().await {
            if self.handle(cmd).await.is_break() {
                debug!("Session for {} stopped", self.connection.config().name());
                return;
            }
        }

        // All handles dropped without an explicit close.
        if let Err(e) = self.connection.close().await {
            warn!("Error closing connection: {}", e);
        }
    }

    /// Runs one command. Breaks once the connection has been closed.
    async fn handle(&mut self, cmd: SessionCommand) -> ControlFlow<()> {
        match cmd {
            SessionCommand::Execute { sql, reply } => {
                let result = QueryExecutor::new(&mut self.connection).execute(&sql).await;
                self.history.record(self.connection.conn_id(), &result);
                let _ = reply.send(result);
            }
            SessionCommand::ExecuteParameterized { sql, params, reply } => {
                let result = QueryExecutor::new(&mut self.connection)
                    .execute_parameterized(&sql, &params)
                    .await;
                self.history.record(self.connection.conn_id(), &result);
                let _ = reply.send(result);
            }
            SessionCommand::History { reply } => {
                let _ = reply.send(self.history.all());
            }
            SessionCommand::Recent { n, reply } => {
                let _ = reply.send(self.history.recent(n));
            }
            SessionCommand::Search { term, reply } => {
                let _ = reply.send(self.history.search(&term));
            }
            SessionCommand::ForConnection { conn_id, reply } => {
                let _ = reply.send(self.history.for_connection(conn_id));
            }
            SessionCommand::Entry { history_id, reply } => {
                let _ = reply.send(self.history.by_id(history_id).cloned());
            }
            SessionCommand::ClearHistory { reply } => {
                self.history.clear();
                let _ = reply.send(());
            }
            SessionCommand::IsValid { reply } => {
                let _ = reply.send(self.connection.is_valid().await);
            }
            SessionCommand::Close { reply } => {
                let _ = reply.send(self.connection.close().await);
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }
}

/// Cloneable handle for sending commands to a session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionCommand>,
    conn_id: i64,
    name: String,
}

impl SessionHandle {
    /// Identifier of the connection owned by the session.
    pub fn conn_id(&self) -> i64 {
        self.conn_id
    }

    /// Display name of the connection owned by the session.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Executes a literal statement and records it in history.
    pub async fn execute(&self, sql: impl Into<String>) -> Result<QueryResult> {
        let sql = sql.into();
        self.request(|reply| SessionCommand::Execute { sql, reply })
            .await
    }

    /// Executes a statement with bind values and records it in history.
    pub async fn execute_parameterized(
        &self,
        sql: impl Into<String>,
        params: Vec<Value>,
    ) -> Result<QueryResult> {
        let sql = sql.into();
        self.request(|reply| SessionCommand::ExecuteParameterized { sql, params, reply })
            .await
    }

    pub async fn history(&self) -> Result<Vec<HistoryEntry>> {
        self.request(|reply| SessionCommand::History { reply }).await
    }

    pub async fn recent(&self, n: usize) -> Result<Vec<HistoryEntry>> {
        self.request(|reply| SessionCommand::Recent { n, reply }).await
    }

    pub async fn search(&self, term: impl Into<String>) -> Result<Vec<HistoryEntry>> {
        let term = term.into();
        self.request(|reply| SessionCommand::Search { term, reply })
            .await
    }

    pub async fn for_connection(&self, conn_id: i64) -> Result<Vec<HistoryEntry>> {
        self.request(|reply| SessionCommand::ForConnection { conn_id, reply })
            .await
    }

    pub async fn history_entry(&self, history_id: i64) -> Result<Option<HistoryEntry>> {
        self.request(|reply| SessionCommand::Entry { history_id, reply })
            .await
    }

    pub async fn clear_history(&self) -> Result<()> {
        self.request(|reply| SessionCommand::ClearHistory { reply })
            .await
    }

    /// Runs the liveness probe on the session's connection.
    pub async fn is_valid(&self) -> Result<bool> {
        self.request(|reply| SessionCommand::IsValid { reply }).await
    }

    /// Closes the connection and stops the session.
    pub async fn close(&self) -> Result<()> {
        self.request(|reply| SessionCommand::Close { reply }).await?
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(make(reply))
            .await
            .map_err(|_| QueryDeskError::unexpected("session closed"))?;
        response
            .await
            .map_err(|_| QueryDeskError::unexpected("session closed"))
    }
}
