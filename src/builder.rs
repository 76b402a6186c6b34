//! The rewrite engine: turns a named template plus a parameter source into
//! driver-ready SQL and its ordered arguments.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::cache::TemplateCache;
use crate::error::{Error, Result};
use crate::lexer::{Template, Token};
use crate::record::{self, Record};
use crate::source::{resolve, Source};
use crate::value::Value;

/// How positional placeholders are written in the rendered SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    /// `?` (MySQL, SQLite)
    #[default]
    Sequential,
    /// `$1`, `$2`, … (PostgreSQL)
    Numbered,
}

impl Style {
    fn write(self, out: &mut String, position: usize) {
        match self {
            Style::Sequential => out.push('?'),
            Style::Numbered => {
                out.push('$');
                out.push_str(&position.to_string());
            }
        }
    }
}

impl FromStr for Style {
    type Err = Error;

    /// Parses a style from a driver name or from the placeholder marker itself.
    ///
    /// ```
    /// use sqlx_sqlbind::Style;
    ///
    /// assert_eq!("postgres".parse::<Style>()?, Style::Numbered);
    /// assert_eq!("MySQL".parse::<Style>()?, Style::Sequential);
    /// # Ok::<(), sqlx_sqlbind::Error>(())
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "sqlite" | "?" => Ok(Style::Sequential),
            "postgres" | "postgresql" | "$" => Ok(Style::Numbered),
            _ => Err(Error::UnknownStyle(s.to_owned())),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Style::Sequential => f.write_str("?"),
            Style::Numbered => f.write_str("$"),
        }
    }
}

/// A rendered statement: SQL text with positional placeholders and the
/// arguments to bind to them, in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    sql: String,
    args: Vec<Value>,
}

impl Statement {
    /// The SQL text, with positional placeholders.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The arguments, in placeholder order.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Splits the statement into its SQL text and arguments.
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.args)
    }
}

enum Kind<'a> {
    Only(Vec<String>),
    Exclude(Vec<String>),
    Variables(&'a [&'a str]),
    Values(&'a dyn Source),
    Args(HashMap<String, Value>),
}

/// Adjusts a single render. Modifiers apply in the order they are given.
pub struct Modifier<'a> {
    kind: Kind<'a>,
}

impl<'a> Modifier<'a> {
    /// Restricts bulk expansion to exactly `names`, in that order.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: Kind::Only(names.into_iter().map(Into::into).collect()),
        }
    }

    /// Removes `names` from bulk expansion.
    pub fn exclude<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: Kind::Exclude(names.into_iter().map(Into::into).collect()),
        }
    }

    /// Substitutes `{name}` variables with literal SQL text.
    ///
    /// `pairs` alternates names and replacements: `&["table", "users", "hint", "..."]`.
    /// An empty or odd-sized list makes the render fail with
    /// [`Error::ModifierArguments`]. Variables without a replacement are left
    /// in the SQL as written, braces included.
    ///
    /// The replacement is copied into the SQL as is. Never pass untrusted input.
    pub fn variables(pairs: &'a [&'a str]) -> Self {
        Self {
            kind: Kind::Variables(pairs),
        }
    }

    /// Adds a source consulted for placeholders the primary source has no value for.
    pub fn values(source: &'a dyn Source) -> Self {
        Self {
            kind: Kind::Values(source),
        }
    }

    /// Adds name/value pairs consulted for placeholders the primary source has
    /// no value for.
    pub fn args<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            kind: Kind::Args(
                pairs
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

const POOL_LIMIT: usize = 32;

static BUFFERS: Lazy<Mutex<Vec<String>>> = Lazy::new(Default::default);

/// A scratch SQL buffer borrowed from the process-wide pool and given back on drop.
struct Scratch(String);

impl Scratch {
    fn take() -> Self {
        Self(BUFFERS.lock().pop().unwrap_or_default())
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let mut buf = mem::take(&mut self.0);
        buf.clear();
        let mut pool = BUFFERS.lock();
        if pool.len() < POOL_LIMIT {
            pool.push(buf);
        }
    }
}

impl Deref for Scratch {
    type Target = String;

    fn deref(&self) -> &String {
        &self.0
    }
}

impl DerefMut for Scratch {
    fn deref_mut(&mut self) -> &mut String {
        &mut self.0
    }
}

/// Renders templates with one placeholder style, caching each compiled template.
///
/// Binders are independent: each owns its own cache.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use sqlx_sqlbind::{Binder, Style, Value};
///
/// let binder = Binder::new(Style::Numbered);
/// let params = HashMap::from([("id", Value::from(7)), ("name", Value::from("ann"))]);
///
/// let stmt = binder.render("UPDATE users SET name = :name WHERE id = :id", &params, &[])?;
/// assert_eq!(stmt.sql(), "UPDATE users SET name = $1 WHERE id = $2");
/// assert_eq!(stmt.args(), &[Value::from("ann"), Value::from(7)]);
/// # Ok::<(), sqlx_sqlbind::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct Binder {
    style: Style,
    cache: TemplateCache,
}

impl Binder {
    /// Creates a binder writing placeholders in `style`, with an empty cache.
    pub fn new(style: Style) -> Self {
        Self {
            style,
            cache: TemplateCache::new(),
        }
    }

    /// The placeholder style this binder renders with.
    pub fn style(&self) -> Style {
        self.style
    }

    /// The compiled form of `template`, from this binder's cache.
    pub fn compile(&self, template: &str) -> Arc<Template> {
        self.cache.get_or_compile(template)
    }

    /// Builds the field index of `T` ahead of its first render or scan.
    pub fn register<T: Record>(&self) {
        record::register::<T>();
    }

    /// Renders `template` against `source`.
    ///
    /// # Arguments
    ///
    /// * `template` - SQL with `:name` placeholders, `{name}` variables and the
    ///   `::names`, `::values` and `::name=::value` directives
    /// * `source` - where field names and placeholder values come from
    /// * `modifiers` - per-call adjustments, applied in order
    ///
    /// # Errors
    ///
    /// * [`Error::UnsupportedSource`] if `source` cannot list its fields
    /// * [`Error::ModifierArguments`] for a malformed [`Modifier::variables`] list
    pub fn render(
        &self,
        template: &str,
        source: &dyn Source,
        modifiers: &[Modifier<'_>],
    ) -> Result<Statement> {
        let compiled = self.compile(template);
        let mut names = source.field_names()?;
        let mut tokens = Cow::Borrowed(compiled.tokens());
        let mut extras: Vec<&dyn Source> = Vec::new();

        for modifier in modifiers {
            match &modifier.kind {
                Kind::Only(only) => names = only.clone(),
                Kind::Exclude(excluded) => names.retain(|name| !excluded.contains(name)),
                Kind::Variables(pairs) => {
                    if pairs.is_empty() || pairs.len() % 2 != 0 {
                        return Err(Error::ModifierArguments {
                            modifier: "variables",
                            count: pairs.len(),
                        });
                    }
                    if compiled.has_variables() {
                        tokens = Cow::Owned(substitute(&tokens, pairs));
                    }
                }
                Kind::Values(extra) => extras.push(*extra),
                Kind::Args(map) => extras.push(map),
            }
        }

        if compiled.has_bulk() {
            tokens = Cow::Owned(expand(&tokens, &names));
        }

        let mut sql = Scratch::take();
        let mut args = Vec::new();
        let mut position = 0;
        for token in tokens.iter() {
            match token {
                Token::Sql(text) => sql.push_str(text),
                Token::Variable(name) => {
                    sql.push('{');
                    sql.push_str(name);
                    sql.push('}');
                }
                Token::Placeholder(name) => {
                    let value = resolve(name, source, &extras).into_value().unwrap_or_else(|| {
                        debug!(placeholder = %name, "no value for placeholder, binding NULL");
                        Value::Null
                    });
                    match value {
                        Value::List(items) => {
                            for (i, item) in items.into_iter().enumerate() {
                                if i > 0 {
                                    sql.push_str(", ");
                                }
                                position += 1;
                                self.style.write(&mut sql, position);
                                args.push(item);
                            }
                        }
                        value => {
                            position += 1;
                            self.style.write(&mut sql, position);
                            args.push(value);
                        }
                    }
                }
                Token::Names | Token::Values | Token::NameValue => {
                    return Err(Error::Internal("bulk directive left after expansion"));
                }
            }
        }

        trace!(
            style = %self.style,
            placeholders = position,
            args = args.len(),
            "statement rendered"
        );
        Ok(Statement {
            sql: sql.as_str().to_owned(),
            args,
        })
    }
}

/// Replaces known `{name}` variables with their text.
fn substitute(tokens: &[Token], pairs: &[&str]) -> Vec<Token> {
    let vars: HashMap<&str, &str> = pairs
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .collect();
    tokens
        .iter()
        .map(|token| match token {
            Token::Variable(name) => vars
                .get(name.as_str())
                .map_or_else(|| token.clone(), |text| Token::Sql((*text).to_owned())),
            other => other.clone(),
        })
        .collect()
}

/// Replaces bulk directives with column lists and placeholders for `names`.
fn expand(tokens: &[Token], names: &[String]) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len() + names.len() * 2);
    for token in tokens {
        match token {
            Token::Names => {
                if !names.is_empty() {
                    out.push(Token::Sql(names.join(", ")));
                }
            }
            Token::Values => {
                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        out.push(Token::Sql(", ".to_owned()));
                    }
                    out.push(Token::Placeholder(name.clone()));
                }
            }
            Token::NameValue => {
                for (i, name) in names.iter().enumerate() {
                    let sep = if i > 0 { ", " } else { "" };
                    out.push(Token::Sql(format!("{sep}{name}=")));
                    out.push(Token::Placeholder(name.clone()));
                }
            }
            other => out.push(other.clone()),
        }
    }
    out
}

static DEFAULT_BINDER: Lazy<Binder> = Lazy::new(Binder::default);

/// The process-wide binder behind [`render`] and the sqlx helpers. Sequential style.
pub fn default_binder() -> &'static Binder {
    &DEFAULT_BINDER
}

/// Renders `template` with the default binder.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use sqlx_sqlbind::{render, Modifier, Value};
///
/// let row = HashMap::from([("name", Value::from("ann")), ("age", Value::from(31))]);
/// let stmt = render(
///     "INSERT INTO users (::names) VALUES (::values)",
///     &row,
///     &[Modifier::exclude(["age"])],
/// )?;
/// assert_eq!(stmt.sql(), "INSERT INTO users (name) VALUES (?)");
/// # Ok::<(), sqlx_sqlbind::Error>(())
/// ```
pub fn render(template: &str, source: &dyn Source, modifiers: &[Modifier<'_>]) -> Result<Statement> {
    default_binder().render(template, source, modifiers)
}
