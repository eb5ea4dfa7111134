//! Query execution and result handling.
//!
//! This module turns SQL text plus caller arguments into an engine request
//! and engine tuples back into typed cells.
//!
//! # Overview
//!
//! The query module is organized into:
//! - `placeholder` - Finds `?` and `:name` placeholders in query text
//! - `binder` - Matches placeholders to arguments and decides casts
//! - `rewriter` - Wraps UUID and datetime placeholders in `CAST(...)`
//! - `marshal` - Converts arguments into wire values
//! - `statement` - Statement execution with binding and rewrite caches
//! - `results` - Row cursor and execution summary
//!
//! # Example
//!
//! ```no_run
//! use tntsql::query::{Statement, StatementBuilder};
//! use tntsql::transport::{IprotoTransport, TransportProtocol};
//! use tntsql::types::NamedValue;
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport: Arc<Mutex<dyn TransportProtocol>> =
//!     Arc::new(Mutex::new(IprotoTransport::<tokio::net::TcpStream>::new()));
//!
//! let mut stmt = StatementBuilder::new(transport)
//!     .sql(r#"SELECT "name" FROM "users" WHERE "age" > :age"#)
//!     .build()?;
//!
//! let mut rows = stmt.query(&[NamedValue::named(1, "age", 18i64)]).await?;
//! while let Some(row) = rows.next_row()? {
//!     println!("{:?}", row);
//! }
//! # Ok(())
//! # }
//! ```

pub mod binder;
pub mod marshal;
pub mod placeholder;
pub mod results;
pub mod rewriter;
pub mod statement;

// Re-export commonly used types
pub use binder::bind;
pub use marshal::{marshal, WireValue};
pub use placeholder::{scan, CastType, Placeholder, PlaceholderStyle, ScanMode};
pub use results::{DatetimeMode, ExecResult, Rows};
pub use rewriter::rewrite;
pub use statement::{Statement, StatementBuilder};
