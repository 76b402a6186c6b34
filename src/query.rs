use sqlx::mysql::{MySqlArguments, MySqlQueryResult};
use sqlx::query::Query;
use sqlx::{Executor, MySql};

use crate::builder::{render, Modifier, Statement};
use crate::driver::Bind;
use crate::error::Result;
use crate::record::Record;
use crate::scan::{scan_all, scan_first, Rows};
use crate::source::Source;
use crate::value::Value;

/// Type alias for SQLx Query with MySQL arguments
pub type Q<'q> = Query<'q, MySql, MySqlArguments>;

/// A rendered query, ready to run against any MySQL executor.
///
/// `PreparedQuery` renders the template once, at construction, and keeps the
/// resulting SQL and arguments. A fresh SQLx `Query` borrowing them is built on
/// every execution, so the same prepared query can be run many times, on a
/// pool or inside a transaction.
///
/// # Examples
///
/// ```rust,no_run
/// use std::collections::HashMap;
/// use sqlx::MySqlPool;
/// use sqlx_sqlbind::{PreparedQuery, Value};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
/// let user = HashMap::from([("user_id", Value::from(42)), ("name", Value::from("John Doe"))]);
///
/// let query = PreparedQuery::new("INSERT INTO users (::names) VALUES (::values)", &user, &[])?;
///
/// let result = query.execute(&pool).await?;
/// println!("Inserted {} rows", result.rows_affected());
/// # Ok(())
/// # }
/// ```
///
/// # Using with Transactions
///
/// ```rust,no_run
/// use sqlx::{MySqlPool, Transaction, MySql};
/// use sqlx_sqlbind::{Modifier, PreparedQuery};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
/// let mut tx: Transaction<MySql> = pool.begin().await?;
///
/// let query = PreparedQuery::new(
///     "UPDATE users SET name = :name WHERE user_id IN (:ids)",
///     &(),
///     &[Modifier::args([("name", sqlx_sqlbind::Value::from("Jane Doe"))]),
///       Modifier::args([("ids", vec![1, 2, 3].into_iter().collect::<sqlx_sqlbind::Value>())])],
/// )?;
///
/// query.execute(&mut *tx).await?;
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuery {
    statement: Statement,
}

impl PreparedQuery {
    /// Renders `template` against `source` with the default binder.
    ///
    /// # Arguments
    ///
    /// * `template` - SQL template with named placeholders (e.g., `:user_id`) and bulk directives
    /// * `source` - Map, JSON object or [`Record`] providing the values
    /// * `modifiers` - Per-call adjustments, see [`Modifier`]
    ///
    /// # Errors
    ///
    /// Returns an error if the source has no named fields or a modifier is malformed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::collections::HashMap;
    /// use sqlx_sqlbind::{PreparedQuery, Value};
    ///
    /// let params = HashMap::from([("id", Value::from(42))]);
    /// let query = PreparedQuery::new("SELECT * FROM users WHERE id = :id", &params, &[])?;
    /// assert_eq!(query.sql(), "SELECT * FROM users WHERE id = ?");
    /// # Ok::<(), sqlx_sqlbind::Error>(())
    /// ```
    pub fn new(template: &str, source: &dyn Source, modifiers: &[Modifier<'_>]) -> Result<Self> {
        Ok(Self {
            statement: render(template, source, modifiers)?,
        })
    }

    pub fn sql(&self) -> &str {
        self.statement.sql()
    }

    pub fn args(&self) -> &[Value] {
        self.statement.args()
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    fn query(&self) -> Result<Q<'_>> {
        sqlx::query::<MySql>(self.statement.sql()).bind_all(self.statement.args())
    }

    /// Executes the prepared query using the provided executor.
    ///
    /// # Arguments
    ///
    /// * `executor` - Any SQLx executor (pool, transaction, etc.)
    ///
    /// # Returns
    ///
    /// Returns the MySQL query result containing information about affected rows,
    /// last insert ID, etc.
    ///
    /// # Errors
    ///
    /// Returns an error if an argument cannot be bound or if the database query fails.
    pub async fn execute<'e, E>(&self, executor: E) -> Result<MySqlQueryResult>
    where
        E: Executor<'e, Database = MySql>,
    {
        Ok(self.query()?.execute(executor).await?)
    }

    /// Fetches the first row and binds it onto a new `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRows`](crate::Error::NoRows) when the query returns
    /// nothing, or any error of [`scan`](crate::scan()).
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use std::collections::HashMap;
    /// use sqlx::MySqlPool;
    /// use sqlx_sqlbind::{fields, Fields, PreparedQuery, Record, Value};
    ///
    /// #[derive(Default)]
    /// struct User {
    ///     id: i64,
    ///     name: String,
    /// }
    ///
    /// impl Record for User {
    ///     fn describe(f: &mut Fields<Self>) {
    ///         fields!(f; id = "id,ro", name);
    ///     }
    /// }
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
    /// let params = HashMap::from([("id", Value::from(42))]);
    /// let query = PreparedQuery::new("SELECT * FROM users WHERE id = :id", &params, &[])?;
    ///
    /// let user: User = query.fetch_record(&pool).await?;
    /// println!("Found user: {}", user.name);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fetch_record<'e, E, T>(&self, executor: E) -> Result<T>
    where
        E: Executor<'e, Database = MySql>,
        T: Record + Default,
    {
        let row = self.query()?.fetch_optional(executor).await?;
        let mut dest = T::default();
        scan_first(Rows::new(row.into_iter().collect()), &mut dest)?;
        Ok(dest)
    }

    /// Fetches every row, binding each onto a new `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or if any row cannot be bound.
    pub async fn fetch_records<'e, E, T>(&self, executor: E) -> Result<Vec<T>>
    where
        E: Executor<'e, Database = MySql>,
        T: Record + Default,
    {
        let rows = self.query()?.fetch_all(executor).await?;
        scan_all(Rows::new(rows))
    }
}

impl From<Statement> for PreparedQuery {
    /// Wraps a statement rendered by a custom [`Binder`](crate::Binder).
    fn from(statement: Statement) -> Self {
        Self { statement }
    }
}
