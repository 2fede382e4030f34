//! Database wrapper and the scoped session it opens

use crate::config::ConnectionSettings;
use crate::db::connection::TdsDriver;
use crate::db::driver::{Connection, Cursor, Driver};
use crate::db::query::QueryResult;
use crate::error::{Error, Result};
use crate::script::{split_statements, trailing_fragment};
use futures::future::BoxFuture;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Connection settings plus the driver used to act on them.
///
/// Settings are read once, when the wrapper is built; every session opened
/// from it reuses them.
pub struct Database {
    settings: ConnectionSettings,
    driver: Arc<dyn Driver>,
}

impl Database {
    /// Load settings from `path` and use the TDS driver.
    pub fn from_settings_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = ConnectionSettings::load(path)?;
        Ok(Self::with_driver(settings, TdsDriver::new()))
    }

    pub fn with_driver(settings: ConnectionSettings, driver: impl Driver + 'static) -> Self {
        Self {
            settings,
            driver: Arc::new(driver),
        }
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Open a session. The caller is responsible for [`Session::close`];
    /// prefer [`Database::with_session`].
    pub async fn open(&self) -> Result<Session> {
        let connection = self.driver.connect(&self.settings).await?;
        Ok(Session {
            connection: Some(connection),
            cursor: None,
        })
    }

    /// Open a session, run `f` with it, then close it.
    ///
    /// The cursor and then the connection are closed whether `f` succeeds
    /// or fails. An error from `f` wins over an error from closing.
    pub async fn with_session<T, F>(&self, f: F) -> Result<T>
    where
        F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, Result<T>>,
    {
        let mut session = self.open().await?;
        let outcome = f(&mut session).await;
        let closed = session.close().await;

        match (outcome, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(close_err)) => Err(close_err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                tracing::warn!(error = %close_err, "failed to close session after error");
                Err(err)
            }
        }
    }
}

/// An open session: one connection and at most one live cursor.
pub struct Session {
    connection: Option<Box<dyn Connection>>,
    cursor: Option<Box<dyn Cursor>>,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    /// Execute one statement and fetch all of its rows.
    ///
    /// The previous statement's cursor is closed first. Driver errors are
    /// returned as the driver reported them.
    pub async fn execute_sql_command(&mut self, sql: &str) -> Result<QueryResult> {
        let connection = self.connection.as_mut().ok_or(Error::SessionClosed)?;

        if let Some(mut previous) = self.cursor.take() {
            previous.close().await?;
        }

        tracing::debug!(statement = %sql, "executing");
        let start = Instant::now();

        let cursor = self.cursor.insert(connection.cursor().await?);
        cursor.execute(sql).await?;
        let rows = cursor.fetch_all().await?;

        let result = QueryResult::new(sql, cursor.columns().to_vec(), rows, start.elapsed());
        tracing::debug!(
            rows = result.row_count,
            elapsed_ms = result.execution_time.as_millis() as u64,
            "statement finished"
        );
        Ok(result)
    }

    /// Split `script` into statements and execute them in order.
    ///
    /// Stops at the first failing statement and returns its error.
    pub async fn execute_script(&mut self, script: &str) -> Result<Vec<QueryResult>> {
        if let Some(fragment) = trailing_fragment(script) {
            tracing::warn!(
                fragment = %fragment.trim(),
                "text after the last ';' is not executed"
            );
        }

        let statements = split_statements(script);
        let mut results = Vec::with_capacity(statements.len());

        for statement in &statements {
            results.push(self.execute_sql_command(statement).await?);
        }

        Ok(results)
    }

    /// Read a script file and execute every statement in it.
    pub async fn execute_sql_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<QueryResult>> {
        let path = path.as_ref();
        let script = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::io(path, e))?;

        tracing::info!(path = %path.display(), "running script");
        self.execute_script(&script).await
    }

    /// Close the cursor, then the connection. Safe to call more than once.
    ///
    /// The connection is closed even if closing the cursor failed; the
    /// first failure is returned.
    pub async fn close(&mut self) -> Result<()> {
        let cursor_closed = match self.cursor.take() {
            Some(mut cursor) => cursor.close().await,
            None => Ok(()),
        };

        let connection_closed = match self.connection.take() {
            Some(mut connection) => {
                let closed = connection.close().await;
                tracing::info!("session closed");
                closed
            }
            None => Ok(()),
        };

        cursor_closed.and(connection_closed)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.connection.is_some() {
            tracing::warn!("session dropped while open; connection released without close");
        }
    }
}
