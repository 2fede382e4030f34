//! Driver seam between the session wrapper and a database client
//!
//! A [`Driver`] opens [`Connection`]s; a connection hands out [`Cursor`]s,
//! one per statement. The session wrapper only ever talks to these traits.

use crate::config::ConnectionSettings;
use crate::db::query::{ColumnInfo, Row};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Driver: Send + Sync {
    /// Open an authenticated connection.
    async fn connect(&self, settings: &ConnectionSettings) -> Result<Box<dyn Connection>>;
}

#[async_trait]
pub trait Connection: Send {
    /// Open a cursor on this connection.
    async fn cursor(&mut self) -> Result<Box<dyn Cursor>>;

    /// Close the connection. Using it afterwards must fail.
    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
pub trait Cursor: Send {
    /// Run one statement. Its rows are kept until [`Cursor::fetch_all`].
    async fn execute(&mut self, statement: &str) -> Result<()>;

    /// All rows produced by the last statement. Empty for statements that
    /// return no result set.
    async fn fetch_all(&mut self) -> Result<Vec<Row>>;

    /// Columns of the last statement's result set.
    fn columns(&self) -> &[ColumnInfo];

    async fn close(&mut self) -> Result<()>;
}
