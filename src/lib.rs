//! # sqlx-sqlbind
//!
//! Named parameters, bulk column directives and typed row binding for SQLx.
//!
//! A template is ordinary SQL with a few extra forms. The crate rewrites it into
//! positional SQL plus the ordered argument list, taking the values from a map,
//! a JSON object or a typed [`Record`].
//!
//! ## Features
//!
//! - **Named Placeholders**: `:name` instead of `?`; list values expand to `?, ?, ?` for `IN (...)`
//! - **Bulk Directives**: `::names`, `::values` and `::name=::value` expand to every field of the source
//! - **Inline Variables**: `{name}` is replaced with literal SQL through [`Modifier::variables`]
//! - **Record Binding**: rows are bound back onto records by column name with [`scan`]
//! - **Placeholder Styles**: `?` for MySQL/SQLite or `$N` for PostgreSQL, per [`Binder`]
//! - **Compiled Once**: each template text is lexed once and cached
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sqlx = { version = "0.8", features = ["mysql", "runtime-tokio"] }
//! sqlx-sqlbind = "0.1"
//! ```
//!
//! ## Template Syntax
//!
//! | Form             | Rendered as                                    |
//! |------------------|------------------------------------------------|
//! | `:name`          | one placeholder, or one per element of a list  |
//! | `::names`        | `a, b, c`                                      |
//! | `::values`       | `?, ?, ?`                                      |
//! | `::name=::value` | `a=?, b=?, c=?`                                |
//! | `{name}`         | replacement text, or left as is                |
//! | `::other`        | `:other`                                       |
//! | `"..."`          | copied untouched                               |
//!
//! ## Examples
//!
//! ### Rendering
//!
//! ```rust
//! use sqlx_sqlbind::{fields, render, Fields, Modifier, Record, Value};
//!
//! #[derive(Default)]
//! struct User {
//!     id: i64,
//!     name: String,
//!     email: Option<String>,
//! }
//!
//! impl Record for User {
//!     fn describe(f: &mut Fields<Self>) {
//!         fields!(f; id = "id,ro", name, email);
//!     }
//! }
//!
//! let user = User { id: 7, name: "ann".into(), email: None };
//! let stmt = render("UPDATE users SET ::name=::value WHERE id = :id", &user, &[])?;
//! assert_eq!(stmt.sql(), "UPDATE users SET name=? WHERE id = ?");
//! assert_eq!(stmt.args(), &[Value::from("ann"), Value::Int(7)]);
//!
//! let stmt = render(
//!     "SELECT * FROM {table} WHERE id IN (:ids)",
//!     &(),
//!     &[
//!         Modifier::variables(&["table", "users"]),
//!         Modifier::args([("ids", vec![1, 2, 3].into_iter().collect::<Value>())]),
//!     ],
//! )?;
//! assert_eq!(stmt.sql(), "SELECT * FROM users WHERE id IN (?, ?, ?)");
//! # Ok::<(), sqlx_sqlbind::Error>(())
//! ```
//!
//! ### Query Execution
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use sqlx::MySqlPool;
//! use sqlx_sqlbind::{PreparedQuery, Value};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = MySqlPool::connect("mysql://localhost/test").await?;
//!
//! let row = HashMap::from([("id", Value::from(42)), ("name", Value::from("John Doe"))]);
//! let query = PreparedQuery::new("INSERT INTO users (::names) VALUES (::values)", &row, &[])?;
//!
//! let result = query.execute(&pool).await?;
//! println!("Inserted {} rows", result.rows_affected());
//! # Ok(())
//! # }
//! ```
//!
//! ### Typed Query Results
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use sqlx::MySqlPool;
//! use sqlx_sqlbind::{fields, Fields, PreparedQuery, Record, Value};
//!
//! #[derive(Default)]
//! struct User {
//!     id: i64,
//!     name: String,
//!     email: String,
//! }
//!
//! impl Record for User {
//!     fn describe(f: &mut Fields<Self>) {
//!         fields!(f; id, name, email);
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let pool = MySqlPool::connect("mysql://localhost/test").await?;
//! let params = HashMap::from([("min_age", Value::from(18))]);
//! let query = PreparedQuery::new("SELECT * FROM users WHERE age >= :min_age", &params, &[])?;
//!
//! let users: Vec<User> = query.fetch_records(&pool).await?;
//! for user in users {
//!     println!("{}: {}", user.name, user.email);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Limitations
//!
//! - The SQLx helpers only support MySQL; other drivers can use [`Binder::render`] and bind [`Statement::args`] themselves
//! - Only double-quoted literals are protected from rewriting; single-quoted strings are not
//! - Inline variables are pasted into the SQL verbatim and must never carry untrusted input
//! - [`PreparedQuery::fetch_record`] and [`PreparedQuery::fetch_records`] decode integer, float,
//!   boolean, text and binary columns only; select `DATETIME` or `DECIMAL` columns through
//!   [`PreparedQueryAs`] and `FromRow`, or cast them to text in SQL
//!
//! ## License
//!
//! Licensed under either of Apache License, Version 2.0 or MIT license at your option.

pub mod builder;
pub mod cache;
mod driver;
pub mod error;
pub mod lexer;
pub mod presence;
pub mod query;
pub mod query_as;
pub mod record;
pub mod scan;
pub mod source;
pub mod value;

pub use builder::{default_binder, render, Binder, Modifier, Statement, Style};
pub use error::{Error, Result};
pub use presence::{Patch, ReadOnly};
pub use query::PreparedQuery;
pub use query_as::PreparedQueryAs;
pub use record::{register, FieldIndex, Fields, Record};
pub use scan::{scan, scan_all, scan_first, Cursor, Row, Rows};
pub use source::{Lookup, Source};
pub use value::{Assign, Param, Value};

/// Convenience re-exports for common use cases
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::fields;
    pub use crate::{default_binder, Binder, Modifier, Style};
    pub use crate::{Fields, Patch, ReadOnly, Record};
    pub use crate::{PreparedQuery, PreparedQueryAs};
    pub use crate::{Source, Value};
}
