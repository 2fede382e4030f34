//! Database access: driver seam, TDS driver and the session wrapper

mod connection;
pub mod driver;
mod query;
mod session;

pub use connection::*;
pub use driver::{Connection, Cursor, Driver};
pub use query::{CellValue, ColumnInfo, QueryResult, Row, TdsCursor};
pub use session::*;
