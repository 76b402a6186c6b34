//! Typed records as parameter sources and scan destinations.
//!
//! A record describes its bindable fields once, through [`Record::describe`].
//! The description is turned into a [`FieldIndex`] the first time the type is
//! used (or ahead of time with [`register`]) and cached for the whole process.
//!
//! Each field carries a db tag, in the same form as a struct tag:
//!
//! | Tag          | Meaning                                                     |
//! |--------------|-------------------------------------------------------------|
//! | `""`         | column named after the Rust field                           |
//! | `"id"`       | column `id`                                                 |
//! | `"id,ro"`    | column `id`, left out of `::names`/`::values`/`::name=::value` (`omit` is accepted too) |
//! | `"-"`        | not a column at all                                         |
//!
//! Nested records are flattened into their parent with [`Fields::embed`], or with
//! [`Fields::embed_opt`] when the nested record may be absent.
//!
//! ```
//! use sqlx_sqlbind::{fields, Fields, Record};
//!
//! #[derive(Default)]
//! struct Audit {
//!     created_by: String,
//! }
//!
//! impl Record for Audit {
//!     fn describe(f: &mut Fields<Self>) {
//!         fields!(f; created_by);
//!     }
//! }
//!
//! #[derive(Default)]
//! struct User {
//!     id: i64,
//!     name: String,
//!     cache: u32,
//!     audit: Audit,
//! }
//!
//! impl Record for User {
//!     fn describe(f: &mut Fields<Self>) {
//!         fields!(f; id = "id,ro", name, cache = "-", ..audit);
//!     }
//! }
//!
//! let user = User { id: 1, name: "ann".into(), ..Default::default() };
//! let index = sqlx_sqlbind::record::index::<User>();
//! assert_eq!(index.names_of(&user), vec!["created_by", "name"]);
//! ```

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::source::{Lookup, Source};
use crate::value::{Assign, Param};

type Getter<T> = Arc<dyn for<'a> Fn(&'a T) -> Option<&'a dyn Param> + Send + Sync>;
type Setter<T> = Arc<dyn for<'a> Fn(&'a mut T) -> Option<&'a mut dyn Assign> + Send + Sync>;

fn getter<T, F>(f: F) -> Getter<T>
where
    F: for<'a> Fn(&'a T) -> Option<&'a dyn Param> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn setter<T, F>(f: F) -> Setter<T>
where
    F: for<'a> Fn(&'a mut T) -> Option<&'a mut dyn Assign> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A struct whose fields can be bound by name.
pub trait Record: Sized + 'static {
    /// Declares the bindable fields, usually through the [`fields!`](crate::fields) macro.
    fn describe(fields: &mut Fields<Self>);
}

struct Entry<T> {
    name: String,
    read_only: bool,
    get: Getter<T>,
    get_mut: Setter<T>,
}

/// Field declarations collected by [`Record::describe`].
pub struct Fields<T> {
    entries: Vec<Entry<T>>,
}

impl<T: Record> Fields<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Declares a field. `declared` is the Rust field name, used when the tag
    /// does not name the column.
    pub fn field<V>(
        &mut self,
        declared: &str,
        tag: &str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> &mut Self
    where
        V: Param + Assign + 'static,
    {
        let Some((name, read_only)) = parse_tag(declared, tag) else {
            return self;
        };
        self.entries.push(Entry {
            name,
            read_only,
            get: getter(move |t: &T| Some(get(t) as &dyn Param)),
            get_mut: setter(move |t: &mut T| Some(get_mut(t) as &mut dyn Assign)),
        });
        self
    }

    /// Flattens the fields of a nested record into this one.
    pub fn embed<E: Record>(&mut self, get: fn(&T) -> &E, get_mut: fn(&mut T) -> &mut E) -> &mut Self {
        self.nest::<E, _, _>(move |t| Some(get(t)), move |t| Some(get_mut(t)))
    }

    /// Flattens the fields of a nested record that may be absent.
    ///
    /// While it is absent its fields are not expanded by bulk directives, read
    /// as NULL, and cannot be scanned into.
    ///
    /// A record that embeds its own type (directly or through other records)
    /// is not flattened a second time: the inner occurrence adds no fields.
    pub fn embed_opt<E: Record>(
        &mut self,
        get: fn(&T) -> Option<&E>,
        get_mut: fn(&mut T) -> Option<&mut E>,
    ) -> &mut Self {
        self.nest::<E, _, _>(get, get_mut)
    }

    fn nest<E, G, M>(&mut self, outer: G, outer_mut: M) -> &mut Self
    where
        E: Record,
        G: for<'a> Fn(&'a T) -> Option<&'a E> + Clone + Send + Sync + 'static,
        M: for<'a> Fn(&'a mut T) -> Option<&'a mut E> + Clone + Send + Sync + 'static,
    {
        for Entry {
            name,
            read_only,
            get,
            get_mut,
        } in describe::<E>()
        {
            let outer = outer.clone();
            let outer_mut = outer_mut.clone();
            self.entries.push(Entry {
                name,
                read_only,
                get: getter(move |t: &T| outer(t).and_then(|e| get(e))),
                get_mut: setter(move |t: &mut T| outer_mut(t).and_then(|e| get_mut(e))),
            });
        }
        self
    }
}

thread_local! {
    // record types whose description is in progress on this thread
    static DESCRIBING: RefCell<Vec<TypeId>> = const { RefCell::new(Vec::new()) };
}

struct Describing;

impl Drop for Describing {
    fn drop(&mut self) {
        DESCRIBING.with(|stack| stack.borrow_mut().pop());
    }
}

/// Collects the fields of `T`. A record already being described further up
/// contributes no fields, so self-referencing embeds terminate.
fn describe<T: Record>() -> Vec<Entry<T>> {
    let id = TypeId::of::<T>();
    let cyclic = DESCRIBING.with(|stack| {
        let mut stack = stack.borrow_mut();
        if stack.contains(&id) {
            return true;
        }
        stack.push(id);
        false
    });
    if cyclic {
        debug!(record = type_name::<T>(), "recursive embed not flattened");
        return Vec::new();
    }

    let _describing = Describing;
    let mut fields = Fields::new();
    T::describe(&mut fields);
    fields.entries
}

/// Splits a db tag into its column name and read-only flag. `None` for `"-"`.
fn parse_tag(declared: &str, tag: &str) -> Option<(String, bool)> {
    if tag == "-" {
        return None;
    }
    let (name, modifiers) = tag.split_once(',').unwrap_or((tag, ""));
    let name = if name.is_empty() { declared } else { name };
    let read_only = modifiers
        .split(',')
        .any(|m| matches!(m.trim(), "ro" | "omit"));
    Some((name.to_owned(), read_only))
}

/// Name → accessor map for one record type.
pub struct FieldIndex<T> {
    names: Vec<String>,
    index: HashMap<String, Entry<T>>,
}

impl<T: Record> FieldIndex<T> {
    fn build() -> Self {
        let mut index = HashMap::new();
        // later declarations win
        for entry in describe::<T>() {
            index.insert(entry.name.clone(), entry);
        }
        let mut names: Vec<String> = index
            .values()
            .filter(|entry| !entry.read_only)
            .map(|entry| entry.name.clone())
            .collect();
        names.sort_unstable();
        Self { names, index }
    }

    /// Every bulk-expandable name of the type, sorted.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Bulk-expandable names of one record: fields whose value reports
    /// `will_update() == false`, or that sit in an absent embedded record, are dropped.
    pub fn names_of(&self, record: &T) -> Vec<String> {
        self.names
            .iter()
            .filter(|name| {
                self.index
                    .get(name.as_str())
                    .and_then(|entry| (entry.get)(record))
                    .is_some_and(|value| value.will_update())
            })
            .cloned()
            .collect()
    }

    pub fn value(&self, record: &T, name: &str) -> Lookup {
        match self.index.get(name) {
            None => Lookup::Absent,
            Some(entry) => match (entry.get)(record) {
                Some(value) => Lookup::from_value(value.to_value()),
                None => Lookup::Null,
            },
        }
    }

    /// A writable handle on the field mapped to `name`.
    pub fn address_of<'r>(&self, record: &'r mut T, name: &str) -> Result<&'r mut dyn Assign> {
        let entry = self
            .index
            .get(name)
            .ok_or_else(|| Error::FieldNotFound(name.to_owned()))?;
        (entry.get_mut)(record).ok_or_else(|| Error::NotAddressable(name.to_owned()))
    }
}

type Registry = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

static REGISTRY: Lazy<RwLock<Registry>> = Lazy::new(Default::default);

/// The cached field index of `T`, built on first use.
pub fn index<T: Record>() -> Arc<FieldIndex<T>> {
    let id = TypeId::of::<T>();
    let cached = REGISTRY.read().get(&id).cloned();
    if let Some(index) = cached.and_then(|any| any.downcast::<FieldIndex<T>>().ok()) {
        return index;
    }

    let built = Arc::new(FieldIndex::<T>::build());
    debug!(
        record = type_name::<T>(),
        fields = built.index.len(),
        "record field index built"
    );
    let stored = REGISTRY
        .write()
        .entry(id)
        .or_insert_with(|| built.clone() as Arc<dyn Any + Send + Sync>)
        .clone();
    stored.downcast::<FieldIndex<T>>().unwrap_or(built)
}

/// Builds and caches the field index of `T` ahead of its first use.
pub fn register<T: Record>() {
    let built = FieldIndex::<T>::build();
    debug!(
        record = type_name::<T>(),
        fields = built.index.len(),
        "record registered"
    );
    REGISTRY
        .write()
        .insert(TypeId::of::<T>(), Arc::new(built));
}

/// Bulk-expandable names of `record`, sorted.
pub fn names<T: Record>(record: &T) -> Vec<String> {
    index::<T>().names_of(record)
}

/// A writable handle on the field of `record` mapped to `name`.
pub fn address_of<'r, T: Record>(name: &str, record: &'r mut T) -> Result<&'r mut dyn Assign> {
    index::<T>().address_of(record, name)
}

impl<T: Record> Source for T {
    fn field_names(&self) -> Result<Vec<String>> {
        Ok(index::<T>().names_of(self))
    }

    fn lookup(&self, name: &str) -> Lookup {
        index::<T>().value(self, name)
    }
}

/// Declares record fields inside [`Record::describe`].
///
/// * `name`: field bound under its own name
/// * `name = "tag"`: field with a db tag (`"col"`, `"col,ro"`, `"-"`)
/// * `..name`: embedded record, flattened into the parent
/// * `..?name`: embedded `Option<Box<_>>` record
#[macro_export]
macro_rules! fields {
    ($f:ident;) => {};
    ($f:ident; $field:ident = $tag:literal $(, $($rest:tt)*)?) => {
        $f.field(stringify!($field), $tag, |r| &r.$field, |r| &mut r.$field);
        $crate::fields!($f; $($($rest)*)?);
    };
    ($f:ident; $field:ident $(, $($rest:tt)*)?) => {
        $f.field(stringify!($field), "", |r| &r.$field, |r| &mut r.$field);
        $crate::fields!($f; $($($rest)*)?);
    };
    ($f:ident; .. ? $field:ident $(, $($rest:tt)*)?) => {
        $f.embed_opt(|r| r.$field.as_deref(), |r| r.$field.as_deref_mut());
        $crate::fields!($f; $($($rest)*)?);
    };
    ($f:ident; .. $field:ident $(, $($rest:tt)*)?) => {
        $f.embed(|r| &r.$field, |r| &mut r.$field);
        $crate::fields!($f; $($($rest)*)?);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::Patch;
    use crate::value::Value;

    #[derive(Debug, Default, PartialEq)]
    struct Inner {
        foo: String,
        skipped: i32,
    }

    impl Record for Inner {
        fn describe(f: &mut Fields<Self>) {
            crate::fields!(f; foo = "foo", skipped = "-");
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Outer {
        id: i64,
        bar: String,
        inner: Inner,
        maybe: Option<String>,
    }

    impl Record for Outer {
        fn describe(f: &mut Fields<Self>) {
            crate::fields!(f; id = "id,ro", bar = "bar", ..inner, maybe);
        }
    }

    #[derive(Debug, Default)]
    #[allow(non_snake_case)]
    struct Nullable {
        extra: Option<Box<Inner>>,
        Bar: String,
    }

    impl Record for Nullable {
        fn describe(f: &mut Fields<Self>) {
            crate::fields!(f; ..?extra, Bar);
        }
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag("Foo", ""), Some(("Foo".into(), false)));
        assert_eq!(parse_tag("Foo", "foo"), Some(("foo".into(), false)));
        assert_eq!(parse_tag("Foo", "foo,ro"), Some(("foo".into(), true)));
        assert_eq!(parse_tag("Foo", "foo,omit"), Some(("foo".into(), true)));
        assert_eq!(parse_tag("Foo", ",ro"), Some(("Foo".into(), true)));
        assert_eq!(parse_tag("Foo", "-"), None);
    }

    #[test]
    fn test_names_flatten_embedded_and_skip_read_only() {
        let index = index::<Outer>();
        assert_eq!(index.names(), &["bar", "foo", "maybe"]);
        assert!(index.contains("id"));
        assert!(!index.contains("skipped"));
    }

    #[test]
    fn test_names_of_filters_absent_values() {
        let mut outer = Outer::default();
        assert_eq!(names(&outer), vec!["bar", "foo"]);
        outer.maybe = Some("x".into());
        assert_eq!(names(&outer), vec!["bar", "foo", "maybe"]);
    }

    #[test]
    fn test_read_only_value_is_still_readable() {
        let outer = Outer {
            id: 7,
            ..Default::default()
        };
        assert_eq!(outer.lookup("id"), Lookup::Present(Value::Int(7)));
        assert_eq!(outer.lookup("maybe"), Lookup::Null);
        assert_eq!(outer.lookup("nope"), Lookup::Absent);
    }

    #[test]
    fn test_absent_embedded_record() {
        let mut n = Nullable {
            extra: None,
            Bar: "bazbar".into(),
        };
        assert_eq!(n.field_names().unwrap(), vec!["Bar"]);
        assert_eq!(n.lookup("foo"), Lookup::Null);
        assert!(matches!(
            address_of("foo", &mut n),
            Err(Error::NotAddressable(name)) if name == "foo"
        ));

        n.extra = Some(Box::new(Inner {
            foo: "foobar".into(),
            skipped: 0,
        }));
        assert_eq!(n.field_names().unwrap(), vec!["Bar", "foo"]);
        assert_eq!(n.lookup("foo"), Lookup::Present(Value::from("foobar")));
    }

    #[test]
    fn test_address_of_writes_nested_field() {
        let mut outer = Outer::default();
        address_of("foo", &mut outer)
            .unwrap()
            .assign(Value::from("written"))
            .unwrap();
        address_of("id", &mut outer)
            .unwrap()
            .assign(Value::Int(3))
            .unwrap();
        assert_eq!(outer.inner.foo, "written");
        assert_eq!(outer.id, 3);
        assert!(matches!(
            address_of("skipped", &mut outer),
            Err(Error::FieldNotFound(_))
        ));
    }

    #[test]
    fn test_will_update_capability() {
        #[derive(Default)]
        struct Update {
            name: Patch<String>,
            age: Patch<i64>,
        }

        impl Record for Update {
            fn describe(f: &mut Fields<Self>) {
                crate::fields!(f; name, age);
            }
        }

        let update = Update {
            name: Patch::Set("ann".into()),
            age: Patch::Missing,
        };
        assert_eq!(update.field_names().unwrap(), vec!["name"]);
        assert_eq!(update.lookup("age"), Lookup::Null);
    }

    #[test]
    fn test_register_then_index() {
        #[derive(Default)]
        struct Registered {
            a: i32,
        }

        impl Record for Registered {
            fn describe(f: &mut Fields<Self>) {
                crate::fields!(f; a = "alpha");
            }
        }

        register::<Registered>();
        assert_eq!(index::<Registered>().names(), &["alpha"]);
        assert_eq!(names(&Registered { a: 1 }), vec!["alpha"]);
    }

    #[test]
    fn test_self_embedding_record_terminates() {
        #[derive(Default)]
        struct Node {
            value: i64,
            next: Option<Box<Node>>,
        }

        impl Record for Node {
            fn describe(f: &mut Fields<Self>) {
                crate::fields!(f; value, ..?next);
            }
        }

        let node = Node {
            value: 1,
            next: Some(Box::new(Node::default())),
        };
        assert_eq!(index::<Node>().names(), &["value"]);
        assert_eq!(node.lookup("value"), Lookup::Present(Value::Int(1)));
    }

    #[test]
    fn test_mutually_embedding_records_terminate() {
        #[derive(Default)]
        struct Left {
            l: i32,
            right: Option<Box<Right>>,
        }

        #[derive(Default)]
        struct Right {
            r: i32,
            left: Option<Box<Left>>,
        }

        impl Record for Left {
            fn describe(f: &mut Fields<Self>) {
                crate::fields!(f; l, ..?right);
            }
        }

        impl Record for Right {
            fn describe(f: &mut Fields<Self>) {
                crate::fields!(f; r, ..?left);
            }
        }

        assert_eq!(index::<Left>().names(), &["l", "r"]);
        assert_eq!(index::<Right>().names(), &["l", "r"]);
    }
}
