//! Query results and the TDS cursor that produces them

use crate::db::driver::Cursor;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::Duration;
use tiberius::{Client, Column, ColumnData, ColumnType, FromSql};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::Compat;

pub(crate) type TdsClient = Client<Compat<TcpStream>>;

/// Represents a cell value in the result set
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(String),
    Binary(Vec<u8>),
}

/// One result row, in column order.
pub type Row = Vec<CellValue>;

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            CellValue::Bool(v) => write!(f, "{}", if *v { "true" } else { "false" }),
            CellValue::Int(v) => write!(f, "{}", v),
            CellValue::Float(v) => write!(f, "{:.6}", v),
            CellValue::String(v) => write!(f, "{}", v),
            CellValue::DateTime(v) => write!(f, "{}", v),
            CellValue::Binary(v) => write!(f, "0x{}", hex::encode(v)),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_none(),
            CellValue::Bool(v) => serializer.serialize_bool(*v),
            CellValue::Int(v) => serializer.serialize_i64(*v),
            CellValue::Float(v) => serializer.serialize_f64(*v),
            CellValue::String(v) | CellValue::DateTime(v) => serializer.serialize_str(v),
            CellValue::Binary(_) => serializer.serialize_str(&self.to_string()),
        }
    }
}

/// Column metadata
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub type_name: String,
}

/// Outcome of one executed statement
#[derive(Clone, Debug)]
pub struct QueryResult {
    pub statement: String,
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Row>,
    pub row_count: usize,
    pub execution_time: Duration,
}

impl QueryResult {
    pub fn new(statement: &str, columns: Vec<ColumnInfo>, rows: Vec<Row>, execution_time: Duration) -> Self {
        Self {
            statement: statement.to_string(),
            row_count: rows.len(),
            columns,
            rows,
            execution_time,
        }
    }

    pub fn empty() -> Self {
        Self::new("", Vec::new(), Vec::new(), Duration::ZERO)
    }

    /// True when the statement produced no result set at all. A SELECT
    /// that matched nothing still has columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }
}

/// Cursor over a shared TDS client.
///
/// The client slot is emptied when the owning connection closes, after
/// which every call fails with [`Error::SessionClosed`].
pub struct TdsCursor {
    client: Arc<Mutex<Option<TdsClient>>>,
    columns: Vec<ColumnInfo>,
    pending: Vec<Row>,
    closed: bool,
}

impl TdsCursor {
    pub(crate) fn new(client: Arc<Mutex<Option<TdsClient>>>) -> Self {
        Self {
            client,
            columns: Vec::new(),
            pending: Vec::new(),
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::SessionClosed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Cursor for TdsCursor {
    async fn execute(&mut self, statement: &str) -> Result<()> {
        self.ensure_open()?;
        self.columns.clear();
        self.pending.clear();

        let mut guard = self.client.lock().await;
        let client = guard.as_mut().ok_or(Error::SessionClosed)?;

        let mut stream = client.simple_query(statement).await?;

        // Metadata arrives ahead of the rows, so an empty SELECT keeps its header.
        if let Some(columns) = stream.columns().await? {
            self.columns = columns.iter().map(column_info).collect();
        }

        // Only the first result set is fetched; later ones are discarded.
        let rows = stream.into_first_result().await?;
        self.pending = rows.iter().map(row_values).collect();

        Ok(())
    }

    async fn fetch_all(&mut self) -> Result<Vec<Row>> {
        self.ensure_open()?;
        Ok(std::mem::take(&mut self.pending))
    }

    fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.pending.clear();
        Ok(())
    }
}

fn column_info(col: &Column) -> ColumnInfo {
    ColumnInfo {
        name: col.name().to_string(),
        type_name: type_name(col.column_type()).to_string(),
    }
}

fn row_values(row: &tiberius::Row) -> Row {
    row.cells().map(|(_, data)| cell_value(data)).collect()
}

fn type_name(ty: ColumnType) -> &'static str {
    match ty {
        ColumnType::Null => "NULL",
        ColumnType::Bit | ColumnType::Bitn => "BIT",
        ColumnType::Int1 => "TINYINT",
        ColumnType::Int2 => "SMALLINT",
        ColumnType::Int4 => "INT",
        ColumnType::Int8 => "BIGINT",
        ColumnType::Intn => "INT",
        ColumnType::Float4 => "REAL",
        ColumnType::Float8 | ColumnType::Floatn => "FLOAT",
        ColumnType::Datetime | ColumnType::Datetimen => "DATETIME",
        ColumnType::Datetime4 => "SMALLDATETIME",
        ColumnType::Datetime2 => "DATETIME2",
        ColumnType::DatetimeOffsetn => "DATETIMEOFFSET",
        ColumnType::Daten => "DATE",
        ColumnType::Timen => "TIME",
        ColumnType::Decimaln => "DECIMAL",
        ColumnType::Numericn => "NUMERIC",
        ColumnType::Money => "MONEY",
        ColumnType::Money4 => "SMALLMONEY",
        ColumnType::Guid => "UNIQUEIDENTIFIER",
        ColumnType::BigVarChar => "VARCHAR",
        ColumnType::BigChar => "CHAR",
        ColumnType::NVarchar => "NVARCHAR",
        ColumnType::NChar => "NCHAR",
        ColumnType::Text => "TEXT",
        ColumnType::NText => "NTEXT",
        ColumnType::BigVarBin => "VARBINARY",
        ColumnType::BigBinary => "BINARY",
        ColumnType::Image => "IMAGE",
        ColumnType::Xml => "XML",
        _ => "UNKNOWN",
    }
}

/// Decode one cell by its wire value, so nullable `Intn`/`Floatn` columns
/// keep whatever width the server sent.
fn cell_value(data: &ColumnData<'static>) -> CellValue {
    let value = match data {
        ColumnData::U8(v) => v.map(|v| CellValue::Int(v as i64)),
        ColumnData::I16(v) => v.map(|v| CellValue::Int(v as i64)),
        ColumnData::I32(v) => v.map(|v| CellValue::Int(v as i64)),
        ColumnData::I64(v) => v.map(CellValue::Int),
        ColumnData::F32(v) => v.map(|v| CellValue::Float(v as f64)),
        ColumnData::F64(v) => v.map(CellValue::Float),
        ColumnData::Bit(v) => v.map(CellValue::Bool),
        ColumnData::String(v) => v.as_ref().map(|s| CellValue::String(s.to_string())),
        ColumnData::Guid(v) => v.map(|g| CellValue::String(g.to_string())),
        ColumnData::Binary(v) => v.as_ref().map(|b| CellValue::Binary(b.to_vec())),
        ColumnData::Numeric(v) => v.map(|n| CellValue::String(n.to_string())),
        ColumnData::Xml(v) => v
            .as_ref()
            .map(|x| CellValue::String(x.clone().into_owned().into_string())),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(data)
                .ok()
                .flatten()
                .map(|v| CellValue::DateTime(v.format("%Y-%m-%d %H:%M:%S").to_string()))
        }
        ColumnData::Date(_) => NaiveDate::from_sql(data)
            .ok()
            .flatten()
            .map(|v| CellValue::DateTime(v.format("%Y-%m-%d").to_string())),
        ColumnData::Time(_) => NaiveTime::from_sql(data)
            .ok()
            .flatten()
            .map(|v| CellValue::DateTime(v.format("%H:%M:%S").to_string())),
        ColumnData::DateTimeOffset(_) => DateTime::<FixedOffset>::from_sql(data)
            .ok()
            .flatten()
            .map(|v| CellValue::DateTime(v.format("%Y-%m-%d %H:%M:%S %:z").to_string())),
    };
    value.unwrap_or(CellValue::Null)
}

mod hex {
    pub fn encode(data: &[u8]) -> String {
        data.iter().map(|b| format!("{:02X}", b)).collect()
    }
}
