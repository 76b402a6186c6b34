//! Dynamic SQL values and the conversions between them and Rust field types.

use crate::error::{Error, Result};

/// An owned SQL parameter or column value.
///
/// `List` is the only variant that a render expands into several placeholders
/// (`IN (:ids)` style). `Text` and `Bytes` are always a single parameter.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
}

impl Value {
    /// Whether this is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "unsigned int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
        }
    }
}

macro_rules! value_from {
    ($($t:ty => $variant:ident as $conv:ty),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(<$conv>::from(v))
                }
            }
        )*
    };
}

value_from! {
    bool => Bool as bool,
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => UInt as u64,
    u16 => UInt as u64,
    u32 => UInt as u64,
    u64 => UInt as u64,
    f32 => Float as f64,
    f64 => Float as f64,
    String => Text as String,
    &str => Text as String,
    Vec<u8> => Bytes as Vec<u8>,
    &[u8] => Bytes as Vec<u8>,
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::List(iter.into_iter().map(Into::into).collect())
    }
}

/// A field value that can be sent as a query parameter.
pub trait Param {
    fn to_value(&self) -> Value;

    /// Whether the value should be written by `::names`, `::values` and
    /// `::name=::value`. A value reporting `false` is left out of bulk expansion
    /// but stays readable through an explicit `:name` placeholder.
    fn will_update(&self) -> bool {
        true
    }
}

/// A field that can receive a decoded column value.
pub trait Assign {
    fn assign(&mut self, value: Value) -> Result<()>;
}

fn mismatch(expected: &'static str, found: &Value) -> Error {
    Error::Mismatch {
        expected,
        found: found.kind(),
    }
}

impl Param for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl Assign for Value {
    fn assign(&mut self, value: Value) -> Result<()> {
        *self = value;
        Ok(())
    }
}

macro_rules! int_field {
    ($($t:ty),*) => {
        $(
            impl Param for $t {
                fn to_value(&self) -> Value {
                    Value::from(*self)
                }
            }

            impl Assign for $t {
                fn assign(&mut self, value: Value) -> Result<()> {
                    let converted = match value {
                        Value::Int(v) => <$t>::try_from(v).ok(),
                        Value::UInt(v) => <$t>::try_from(v).ok(),
                        Value::Bool(v) => Some(<$t>::from(v)),
                        ref other => return Err(mismatch(stringify!($t), other)),
                    };
                    *self = converted.ok_or(Error::Mismatch {
                        expected: stringify!($t),
                        found: "out of range int",
                    })?;
                    Ok(())
                }
            }
        )*
    };
}

int_field!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! float_field {
    ($($t:ty),*) => {
        $(
            impl Param for $t {
                fn to_value(&self) -> Value {
                    Value::from(*self)
                }
            }

            impl Assign for $t {
                fn assign(&mut self, value: Value) -> Result<()> {
                    *self = match value {
                        Value::Float(v) => v as $t,
                        Value::Int(v) => v as $t,
                        Value::UInt(v) => v as $t,
                        ref other => return Err(mismatch(stringify!($t), other)),
                    };
                    Ok(())
                }
            }
        )*
    };
}

float_field!(f32, f64);

impl Param for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl Assign for bool {
    fn assign(&mut self, value: Value) -> Result<()> {
        *self = match value {
            Value::Bool(v) => v,
            Value::Int(v) => v != 0,
            Value::UInt(v) => v != 0,
            ref other => return Err(mismatch("bool", other)),
        };
        Ok(())
    }
}

impl Param for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl Param for &'static str {
    fn to_value(&self) -> Value {
        Value::Text((*self).to_owned())
    }
}

impl Assign for String {
    fn assign(&mut self, value: Value) -> Result<()> {
        *self = match value {
            Value::Text(v) => v,
            Value::Bytes(v) => {
                String::from_utf8(v).map_err(|_| Error::Mismatch {
                    expected: "String",
                    found: "non utf-8 bytes",
                })?
            }
            ref other => return Err(mismatch("String", other)),
        };
        Ok(())
    }
}

impl Param for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

impl Assign for Vec<u8> {
    fn assign(&mut self, value: Value) -> Result<()> {
        *self = match value {
            Value::Bytes(v) => v,
            Value::Text(v) => v.into_bytes(),
            ref other => return Err(mismatch("Vec<u8>", other)),
        };
        Ok(())
    }
}

// Sequences expand into one placeholder per element. `Vec<u8>` is bytes, above.
macro_rules! list_field {
    ($($t:ty),*) => {
        $(
            impl Param for Vec<$t> {
                fn to_value(&self) -> Value {
                    Value::List(self.iter().map(Param::to_value).collect())
                }
            }

            impl Assign for Vec<$t> {
                fn assign(&mut self, value: Value) -> Result<()> {
                    match value {
                        Value::List(items) => {
                            let mut out = Vec::with_capacity(items.len());
                            for item in items {
                                let mut slot = <$t>::default();
                                slot.assign(item)?;
                                out.push(slot);
                            }
                            *self = out;
                            Ok(())
                        }
                        ref other => Err(mismatch(concat!("Vec<", stringify!($t), ">"), other)),
                    }
                }
            }
        )*
    };
}

list_field!(i16, i32, i64, u16, u32, u64, f32, f64, bool, String, Value);

/// `None` is a nil pointer: bound as NULL when referenced explicitly, never
/// written by bulk directives.
impl<T: Param> Param for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, Param::to_value)
    }

    fn will_update(&self) -> bool {
        self.as_ref().is_some_and(Param::will_update)
    }
}

impl<T: Assign + Default> Assign for Option<T> {
    fn assign(&mut self, value: Value) -> Result<()> {
        if value.is_null() {
            *self = None;
            return Ok(());
        }
        let mut inner = T::default();
        inner.assign(value)?;
        *self = Some(inner);
        Ok(())
    }
}
