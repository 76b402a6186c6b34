//! MySQL plumbing: binding [`Value`]s to sqlx queries and decoding sqlx rows.

use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::query::{Query, QueryAs};
use sqlx::{Column, Encode, MySql, Row as _, Type, TypeInfo, ValueRef};

use crate::error::{Error, Result};
use crate::scan::Row;
use crate::value::Value;

/// A sqlx query that takes positional arguments.
pub(crate) trait Bind<'q>: Sized {
    fn bind_one<T>(self, value: T) -> Self
    where
        T: 'q + Encode<'q, MySql> + Type<MySql>;

    /// Binds `args` in order.
    ///
    /// Nulls are sent as a typed NULL. A list cannot be sent as one parameter
    /// and fails with [`Error::UnsupportedValue`].
    fn bind_all(self, args: &[Value]) -> Result<Self> {
        let mut query = self;
        for arg in args {
            query = match arg {
                Value::Null => query.bind_one(None::<String>),
                Value::Bool(v) => query.bind_one(*v),
                Value::Int(v) => query.bind_one(*v),
                Value::UInt(v) => query.bind_one(*v),
                Value::Float(v) => query.bind_one(*v),
                Value::Text(v) => query.bind_one(v.clone()),
                Value::Bytes(v) => query.bind_one(v.clone()),
                Value::List(_) => {
                    return Err(Error::UnsupportedValue(
                        "nested list cannot be bound as a single parameter".into(),
                    ))
                }
            };
        }
        Ok(query)
    }
}

impl<'q> Bind<'q> for Query<'q, MySql, MySqlArguments> {
    fn bind_one<T>(self, value: T) -> Self
    where
        T: 'q + Encode<'q, MySql> + Type<MySql>,
    {
        self.bind(value)
    }
}

impl<'q, R> Bind<'q> for QueryAs<'q, MySql, R, MySqlArguments> {
    fn bind_one<T>(self, value: T) -> Self
    where
        T: 'q + Encode<'q, MySql> + Type<MySql>,
    {
        self.bind(value)
    }
}

impl Row for MySqlRow {
    fn column_names(&self) -> Result<Vec<String>> {
        Ok(self
            .columns()
            .iter()
            .map(|column| column.name().to_owned())
            .collect())
    }

    /// Decodes integer, float, boolean, text and binary columns. Temporal and
    /// decimal columns fail with [`Error::UnsupportedValue`].
    fn decode(&self, index: usize) -> Result<Value> {
        let raw = self.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        let type_name = raw.type_info().name().to_owned();

        if let Ok(v) = self.try_get::<i64, _>(index) {
            return Ok(Value::Int(v));
        }
        if let Ok(v) = self.try_get::<u64, _>(index) {
            return Ok(Value::UInt(v));
        }
        if let Ok(v) = self.try_get::<f64, _>(index) {
            return Ok(Value::Float(v));
        }
        if let Ok(v) = self.try_get::<bool, _>(index) {
            return Ok(Value::Bool(v));
        }
        if let Ok(v) = self.try_get::<String, _>(index) {
            return Ok(Value::Text(v));
        }
        if let Ok(v) = self.try_get::<Vec<u8>, _>(index) {
            return Ok(Value::Bytes(v));
        }
        Err(Error::UnsupportedValue(format!(
            "cannot decode column {index} of type {type_name}"
        )))
    }
}
