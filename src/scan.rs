//! Binding result rows onto records.
//!
//! The binder walks the columns of a row by name. A column mapped to a field of
//! the destination is decoded and assigned to it; any other column is skipped.
//! Decoding itself is left to the driver through the [`Row`] trait.

use tracing::trace;

use crate::error::{Error, Result};
use crate::record::{self, Record};
use crate::value::Value;

/// One result row, as seen by the binder.
pub trait Row {
    /// Column names, in result order.
    fn column_names(&self) -> Result<Vec<String>>;

    /// Decodes the column at `index`.
    fn decode(&self, index: usize) -> Result<Value>;

    /// Consumes a column that no field is mapped to. Random-access rows have
    /// nothing to do here.
    fn skip(&self, _index: usize) -> Result<()> {
        Ok(())
    }
}

/// A forward-only sequence of rows.
pub trait Cursor: Row {
    /// Moves to the next row. `false` once the rows are exhausted.
    fn advance(&mut self) -> Result<bool>;
}

/// Scans the current row of `row` into `dest`.
///
/// Columns without a matching field are skipped. Scanning stops at the first
/// decode or assignment error, or at a column whose field cannot be written
/// ([`Error::NotAddressable`]).
///
/// # Examples
///
/// ```
/// use sqlx_sqlbind::{fields, scan, Fields, Record, Result, Row, Value};
///
/// #[derive(Default)]
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// impl Record for User {
///     fn describe(f: &mut Fields<Self>) {
///         fields!(f; id, name);
///     }
/// }
///
/// struct Fixed;
///
/// impl Row for Fixed {
///     fn column_names(&self) -> Result<Vec<String>> {
///         Ok(vec!["id".into(), "name".into(), "created_at".into()])
///     }
///
///     fn decode(&self, index: usize) -> Result<Value> {
///         Ok([Value::Int(7), Value::from("ann"), Value::Null][index].clone())
///     }
/// }
///
/// let mut user = User::default();
/// scan(&Fixed, &mut user)?;
/// assert_eq!((user.id, user.name.as_str()), (7, "ann"));
/// # Ok::<(), sqlx_sqlbind::Error>(())
/// ```
pub fn scan<R, T>(row: &R, dest: &mut T) -> Result<()>
where
    R: Row + ?Sized,
    T: Record,
{
    let index = record::index::<T>();
    for (i, name) in row.column_names()?.iter().enumerate() {
        match index.address_of(dest, name) {
            Ok(field) => {
                field.assign(row.decode(i)?)?;
                trace!(column = %name, "column scanned");
            }
            Err(Error::FieldNotFound(_)) => {
                row.skip(i)?;
                trace!(column = %name, "column discarded");
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

/// Scans the first row of `cursor` into `dest`, then releases the cursor.
///
/// # Errors
///
/// [`Error::NoRows`] when the cursor is empty, otherwise as [`scan`].
pub fn scan_first<C, T>(mut cursor: C, dest: &mut T) -> Result<()>
where
    C: Cursor,
    T: Record,
{
    if !cursor.advance()? {
        return Err(Error::NoRows);
    }
    scan(&cursor, dest)
}

/// Scans every remaining row of `cursor` into a fresh `T`.
pub fn scan_all<C, T>(mut cursor: C) -> Result<Vec<T>>
where
    C: Cursor,
    T: Record + Default,
{
    let mut out = Vec::new();
    while cursor.advance()? {
        let mut dest = T::default();
        scan(&cursor, &mut dest)?;
        out.push(dest);
    }
    Ok(out)
}

/// An in-memory cursor over already fetched rows.
#[derive(Debug)]
pub struct Rows<R> {
    pending: std::vec::IntoIter<R>,
    current: Option<R>,
}

impl<R> Rows<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            pending: rows.into_iter(),
            current: None,
        }
    }

    /// The row the cursor is on, `None` before the first advance and after the last.
    pub fn current(&self) -> Option<&R> {
        self.current.as_ref()
    }

    fn row(&self) -> Result<&R> {
        self.current.as_ref().ok_or(Error::NoRows)
    }
}

impl<R> From<Vec<R>> for Rows<R> {
    fn from(rows: Vec<R>) -> Self {
        Self::new(rows)
    }
}

impl<R: Row> Row for Rows<R> {
    fn column_names(&self) -> Result<Vec<String>> {
        self.row()?.column_names()
    }

    fn decode(&self, index: usize) -> Result<Value> {
        self.row()?.decode(index)
    }

    fn skip(&self, index: usize) -> Result<()> {
        self.row()?.skip(index)
    }
}

impl<R: Row> Cursor for Rows<R> {
    fn advance(&mut self) -> Result<bool> {
        self.current = self.pending.next();
        Ok(self.current.is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::record::Fields;

    struct MockRow {
        columns: Vec<&'static str>,
        values: Vec<Value>,
        skipped: Cell<usize>,
    }

    fn row(columns: &[&'static str], values: Vec<Value>) -> MockRow {
        MockRow {
            columns: columns.to_vec(),
            values,
            skipped: Cell::new(0),
        }
    }

    fn foo_bar_baz() -> MockRow {
        row(
            &["foo", "bar", "baz"],
            vec![Value::from("foobar"), Value::from("barbar"), Value::Int(42)],
        )
    }

    impl Row for MockRow {
        fn column_names(&self) -> Result<Vec<String>> {
            Ok(self.columns.iter().map(|c| (*c).to_owned()).collect())
        }

        fn decode(&self, index: usize) -> Result<Value> {
            self.values
                .get(index)
                .cloned()
                .ok_or(Error::Internal("column out of range"))
        }

        fn skip(&self, _index: usize) -> Result<()> {
            self.skipped.set(self.skipped.get() + 1);
            Ok(())
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Flat {
        id: i32,
        foo: String,
        baz: i32,
        bar: String,
    }

    impl Record for Flat {
        fn describe(f: &mut Fields<Self>) {
            crate::fields!(f; id = "-", foo = "foo", baz = "baz", bar = "bar");
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Sub {
        foo: String,
    }

    impl Record for Sub {
        fn describe(f: &mut Fields<Self>) {
            crate::fields!(f; foo = "foo");
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct WithSub {
        id: i32,
        sub: Sub,
        baz: i32,
        bar: String,
    }

    impl Record for WithSub {
        fn describe(f: &mut Fields<Self>) {
            crate::fields!(f; id = "-", ..sub, baz = "baz", bar = "bar");
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct WithSubPtr {
        sub: Option<Box<Sub>>,
        baz: i32,
        bar: String,
    }

    impl Record for WithSubPtr {
        fn describe(f: &mut Fields<Self>) {
            crate::fields!(f; ..?sub, baz = "baz", bar = "bar");
        }
    }

    #[test]
    fn test_scan() {
        let mut dest = Flat::default();
        scan(&foo_bar_baz(), &mut dest).unwrap();
        assert_eq!(
            dest,
            Flat {
                id: 0,
                foo: "foobar".into(),
                baz: 42,
                bar: "barbar".into(),
            }
        );
    }

    #[test]
    fn test_scan_embedded() {
        let mut dest = WithSub::default();
        scan(&foo_bar_baz(), &mut dest).unwrap();
        assert_eq!(dest.sub.foo, "foobar");
        assert_eq!(dest.bar, "barbar");
        assert_eq!(dest.baz, 42);
    }

    #[test]
    fn test_scan_embedded_pointer() {
        let mut dest = WithSubPtr {
            sub: Some(Box::default()),
            ..Default::default()
        };
        scan(&foo_bar_baz(), &mut dest).unwrap();
        assert_eq!(
            dest,
            WithSubPtr {
                sub: Some(Box::new(Sub {
                    foo: "foobar".into()
                })),
                baz: 42,
                bar: "barbar".into(),
            }
        );
    }

    #[test]
    fn test_scan_absent_embedded_aborts() {
        let mut dest = WithSubPtr::default();
        let err = scan(&foo_bar_baz(), &mut dest).unwrap_err();
        assert!(matches!(err, Error::NotAddressable(name) if name == "foo"));
    }

    #[test]
    fn test_scan_extra_column_is_skipped() {
        let source = row(
            &["foo", "bar", "baz", "foobar"],
            vec![
                Value::from("foobar"),
                Value::from("barbar"),
                Value::Int(42),
                Value::from("foobarbar"),
            ],
        );
        let mut dest = Flat::default();
        scan(&source, &mut dest).unwrap();
        assert_eq!(dest.foo, "foobar");
        assert_eq!(dest.baz, 42);
        assert_eq!(source.skipped.get(), 1);
    }

    #[test]
    fn test_scan_mismatch_aborts() {
        let source = row(&["baz"], vec![Value::from("not a number")]);
        let mut dest = Flat::default();
        let err = scan(&source, &mut dest).unwrap_err();
        assert!(matches!(err, Error::Mismatch { expected: "i32", .. }));
    }

    #[test]
    fn test_scan_first() {
        let second = row(&["foo"], vec![Value::from("second")]);
        let mut dest = Flat::default();
        scan_first(Rows::new(vec![foo_bar_baz(), second]), &mut dest).unwrap();
        assert_eq!(dest.foo, "foobar");
        assert_eq!(dest.bar, "barbar");
    }

    #[test]
    fn test_scan_first_no_rows() {
        let mut dest = Flat::default();
        let err = scan_first(Rows::<MockRow>::new(Vec::new()), &mut dest).unwrap_err();
        assert!(matches!(err, Error::NoRows));
        assert_eq!(dest, Flat::default());
    }

    #[test]
    fn test_scan_all() {
        let rows = Rows::from(vec![
            foo_bar_baz(),
            row(&["foo", "baz"], vec![Value::from("again"), Value::UInt(7)]),
        ]);
        let all: Vec<Flat> = scan_all(rows).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].foo, "again");
        assert_eq!(all[1].baz, 7);
        assert!(all[1].bar.is_empty());
    }

    #[test]
    fn test_rows_before_advance() {
        let rows = Rows::new(vec![foo_bar_baz()]);
        assert!(rows.current().is_none());
        assert!(matches!(rows.column_names(), Err(Error::NoRows)));
    }
}
