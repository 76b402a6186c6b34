//! Field wrappers that control whether a value takes part in bulk writes.
//!
//! In a PATCH-style update, plain fields cannot tell an empty value from a
//! value that was never sent. [`Patch`] keeps the three cases apart:
//!
//! * `Patch::Missing` is never expanded by `::names`, `::values` or `::name=::value`
//! * `Patch::Null` is expanded and bound as NULL
//! * `Patch::Set(v)` is expanded and bound as `v`
//!
//! [`ReadOnly`] is never expanded at all, whatever it holds.

use crate::error::Result;
use crate::value::{Assign, Param, Value};

/// A value that may be absent, null, or set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Missing,
    Null,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Patch::Missing)
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Patch::Set(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(v: Option<T>) -> Self {
        v.map_or(Patch::Null, Patch::Set)
    }
}

impl<T: Param> Param for Patch<T> {
    fn to_value(&self) -> Value {
        match self {
            Patch::Set(v) => v.to_value(),
            Patch::Missing | Patch::Null => Value::Null,
        }
    }

    fn will_update(&self) -> bool {
        !self.is_missing()
    }
}

impl<T: Assign + Default> Assign for Patch<T> {
    fn assign(&mut self, value: Value) -> Result<()> {
        if value.is_null() {
            *self = Patch::Null;
            return Ok(());
        }
        let mut inner = T::default();
        inner.assign(value)?;
        *self = Patch::Set(inner);
        Ok(())
    }
}

/// A value that is read from the database but never written by bulk directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord, Hash)]
pub struct ReadOnly<T>(pub T);

impl<T> ReadOnly<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for ReadOnly<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Param> Param for ReadOnly<T> {
    fn to_value(&self) -> Value {
        self.0.to_value()
    }

    fn will_update(&self) -> bool {
        false
    }
}

impl<T: Assign> Assign for ReadOnly<T> {
    fn assign(&mut self, value: Value) -> Result<()> {
        self.0.assign(value)
    }
}
