use std::marker::PhantomData;

use sqlx::{
    mysql::{MySqlArguments, MySqlRow},
    query::QueryAs,
    Executor, MySql,
};

use crate::builder::{render, Modifier, Statement};
use crate::driver::Bind;
use crate::error::Result;
use crate::source::Source;
use crate::value::Value;

/// Type alias for SQLx QueryAs with MySQL arguments
pub type QA<'q, R> = QueryAs<'q, MySql, R, MySqlArguments>;

/// A rendered query that returns typed results through SQLx's `FromRow`.
///
/// `PreparedQueryAs` is similar to [`PreparedQuery`](crate::PreparedQuery) but
/// decodes rows with `FromRow` instead of the record binder. It supports
/// `fetch_all`, `fetch_one`, and `fetch_optional`.
///
/// # Type Parameters
///
/// * `R` - The result type that implements `FromRow`
///
/// # Examples
///
/// ```rust,no_run
/// use std::collections::HashMap;
/// use sqlx::{MySqlPool, FromRow};
/// use sqlx_sqlbind::{PreparedQueryAs, Value};
///
/// #[derive(FromRow)]
/// struct User {
///     id: i32,
///     name: String,
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
/// let params = HashMap::from([("id", Value::from(42))]);
///
/// let query = PreparedQueryAs::<User>::new("SELECT id, name FROM users WHERE id = :id", &params, &[])?;
///
/// let user: User = query.fetch_one(&pool).await?;
/// println!("User: {} ({})", user.name, user.id);
/// # Ok(())
/// # }
/// ```
pub struct PreparedQueryAs<R> {
    statement: Statement,
    _pd: PhantomData<fn() -> R>,
}

impl<R> PreparedQueryAs<R>
where
    for<'row> R: sqlx::FromRow<'row, MySqlRow> + Send + Unpin,
{
    /// Renders `template` against `source` with the default binder.
    ///
    /// # Errors
    ///
    /// Returns an error if the source has no named fields or a modifier is malformed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::collections::HashMap;
    /// use sqlx::FromRow;
    /// use sqlx_sqlbind::{PreparedQueryAs, Value};
    ///
    /// #[derive(FromRow)]
    /// struct User {
    ///     id: i32,
    ///     name: String,
    /// }
    ///
    /// let params = HashMap::from([("id", Value::from(42))]);
    /// let query = PreparedQueryAs::<User>::new("SELECT id, name FROM users WHERE id = :id", &params, &[])?;
    /// assert_eq!(query.sql(), "SELECT id, name FROM users WHERE id = ?");
    /// # Ok::<(), sqlx_sqlbind::Error>(())
    /// ```
    pub fn new(template: &str, source: &dyn Source, modifiers: &[Modifier<'_>]) -> Result<Self> {
        Ok(Self::from_statement(render(template, source, modifiers)?))
    }

    /// Wraps a statement rendered by a custom [`Binder`](crate::Binder).
    pub fn from_statement(statement: Statement) -> Self {
        Self {
            statement,
            _pd: PhantomData,
        }
    }

    pub fn sql(&self) -> &str {
        self.statement.sql()
    }

    pub fn args(&self) -> &[Value] {
        self.statement.args()
    }

    fn query(&self) -> Result<QA<'_, R>> {
        sqlx::query_as::<MySql, R>(self.statement.sql()).bind_all(self.statement.args())
    }

    /// Executes the query and returns all matching rows.
    ///
    /// # Arguments
    ///
    /// * `executor` - Any SQLx executor (pool, transaction, etc.)
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or if any row cannot be converted to type `R`.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use std::collections::HashMap;
    /// use sqlx::{MySqlPool, FromRow};
    /// use sqlx_sqlbind::{PreparedQueryAs, Value};
    ///
    /// #[derive(FromRow)]
    /// struct User {
    ///     id: i32,
    ///     name: String,
    /// }
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
    /// let params = HashMap::from([("min_age", Value::from(18))]);
    /// let query = PreparedQueryAs::<User>::new(
    ///     "SELECT id, name FROM users WHERE age > :min_age",
    ///     &params,
    ///     &[],
    /// )?;
    ///
    /// let users: Vec<User> = query.fetch_all(&pool).await?;
    /// println!("Found {} users", users.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fetch_all<'e, E>(&self, executor: E) -> Result<Vec<R>>
    where
        E: Executor<'e, Database = MySql>,
    {
        Ok(self.query()?.fetch_all(executor).await?)
    }

    /// Executes the query and returns exactly one row.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No rows are found
    /// - The query fails
    /// - The row cannot be converted to type `R`
    pub async fn fetch_one<'e, E>(&self, executor: E) -> Result<R>
    where
        E: Executor<'e, Database = MySql>,
    {
        Ok(self.query()?.fetch_one(executor).await?)
    }

    /// Executes the query and returns at most one row.
    ///
    /// # Returns
    ///
    /// Returns `Some(row)` for the first matching row, `None` if no rows match.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use std::collections::HashMap;
    /// use sqlx::{MySqlPool, FromRow};
    /// use sqlx_sqlbind::{PreparedQueryAs, Value};
    ///
    /// #[derive(FromRow)]
    /// struct User {
    ///     id: i32,
    ///     name: String,
    /// }
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
    /// let params = HashMap::from([("email", Value::from("user@example.com"))]);
    /// let query = PreparedQueryAs::<User>::new(
    ///     "SELECT id, name FROM users WHERE email = :email",
    ///     &params,
    ///     &[],
    /// )?;
    ///
    /// match query.fetch_optional(&pool).await? {
    ///     Some(user) => println!("Found user: {}", user.name),
    ///     None => println!("User not found"),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fetch_optional<'e, E>(&self, executor: E) -> Result<Option<R>>
    where
        E: Executor<'e, Database = MySql>,
    {
        Ok(self.query()?.fetch_optional(executor).await?)
    }
}
