//! sqlrunner - run SQL statements and `;`-delimited script files against a
//! database described by a connection settings file.
//!
//! ```no_run
//! use sqlrunner::{client, Database};
//!
//! # async fn demo() -> sqlrunner::Result<()> {
//! client::init_client("/opt/sqlclient")?;
//!
//! let db = Database::from_settings_file("connection_settings.json")?;
//! let results = db
//!     .with_session(|session| {
//!         Box::pin(async move { session.execute_sql_file("script.sql").await })
//!     })
//!     .await?;
//!
//! for result in results {
//!     for row in &result.rows {
//!         println!("{:?}", row);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod output;
pub mod script;
pub mod utils;

pub use config::ConnectionSettings;
pub use db::{CellValue, ColumnInfo, Database, QueryResult, Session};
pub use error::{Error, Result};
pub use script::split_statements;
