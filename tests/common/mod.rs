//! In-memory driver that records every call made through the driver seam.

#![allow(dead_code)]

use async_trait::async_trait;
use sqlrunner::db::{Connection, Cursor, Driver};
use sqlrunner::{CellValue, ColumnInfo, ConnectionSettings, Error, Result};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Connect,
    OpenCursor(usize),
    Execute(usize, String),
    CloseCursor(usize),
    CloseConnection,
}

#[derive(Debug)]
pub struct StatementFailed(pub String);

impl std::fmt::Display for StatementFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "statement failed: {:?}", self.0)
    }
}

impl std::error::Error for StatementFailed {}

#[derive(Clone, Default)]
pub struct RecordingDriver {
    events: Arc<Mutex<Vec<Event>>>,
    failing: Arc<HashSet<String>>,
    fail_cursor_close: bool,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statements that make `execute` fail. The empty statement always fails.
    pub fn failing_on(statements: &[&str]) -> Self {
        Self {
            failing: Arc::new(statements.iter().map(|s| s.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn with_failing_cursor_close(mut self) -> Self {
        self.fail_cursor_close = true;
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn executed(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Execute(_, sql) => Some(sql),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Event) -> usize {
        self.events().iter().filter(|e| *e == wanted).count()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl Driver for RecordingDriver {
    async fn connect(&self, _settings: &ConnectionSettings) -> Result<Box<dyn Connection>> {
        self.record(Event::Connect);
        Ok(Box::new(RecordingConnection {
            driver: self.clone(),
            next_cursor: 0,
            closed: Arc::new(Mutex::new(false)),
        }))
    }
}

struct RecordingConnection {
    driver: RecordingDriver,
    next_cursor: usize,
    closed: Arc<Mutex<bool>>,
}

#[async_trait]
impl Connection for RecordingConnection {
    async fn cursor(&mut self) -> Result<Box<dyn Cursor>> {
        if *self.closed.lock().unwrap() {
            return Err(Error::SessionClosed);
        }
        let id = self.next_cursor;
        self.next_cursor += 1;
        self.driver.record(Event::OpenCursor(id));
        Ok(Box::new(RecordingCursor {
            id,
            driver: self.driver.clone(),
            connection_closed: Arc::clone(&self.closed),
            columns: Vec::new(),
            rows: Vec::new(),
            closed: false,
        }))
    }

    async fn close(&mut self) -> Result<()> {
        let mut closed = self.closed.lock().unwrap();
        assert!(!*closed, "connection closed twice");
        *closed = true;
        self.driver.record(Event::CloseConnection);
        Ok(())
    }
}

struct RecordingCursor {
    id: usize,
    driver: RecordingDriver,
    connection_closed: Arc<Mutex<bool>>,
    columns: Vec<ColumnInfo>,
    rows: Vec<Vec<CellValue>>,
    closed: bool,
}

#[async_trait]
impl Cursor for RecordingCursor {
    async fn execute(&mut self, statement: &str) -> Result<()> {
        if self.closed || *self.connection_closed.lock().unwrap() {
            return Err(Error::SessionClosed);
        }
        self.driver.record(Event::Execute(self.id, statement.to_string()));

        if statement.is_empty() || self.driver.failing.contains(statement) {
            return Err(Error::driver(StatementFailed(statement.to_string())));
        }

        // One row echoing the statement, so results can be told apart;
        // `... where 1 = 0` yields the header alone.
        self.columns = vec![ColumnInfo {
            name: "statement".to_string(),
            type_name: "NVARCHAR".to_string(),
        }];
        self.rows = if statement.ends_with("where 1 = 0") {
            Vec::new()
        } else {
            vec![vec![CellValue::String(statement.to_string())]]
        };
        Ok(())
    }

    async fn fetch_all(&mut self) -> Result<Vec<Vec<CellValue>>> {
        Ok(std::mem::take(&mut self.rows))
    }

    fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    async fn close(&mut self) -> Result<()> {
        assert!(!self.closed, "cursor closed twice");
        self.closed = true;
        self.driver.record(Event::CloseCursor(self.id));
        if self.driver.fail_cursor_close {
            return Err(Error::driver(StatementFailed("cursor close".to_string())));
        }
        Ok(())
    }
}

pub fn settings() -> ConnectionSettings {
    ConnectionSettings::from_json_str(
        r#"{"username":"scott","password":"tiger","hostname":"localhost","port":"1433","sid":"test"}"#,
    )
    .unwrap()
}
