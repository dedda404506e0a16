//! Core types - Values, callbacks, props.
//!
//! The host scope is dynamically typed, so bridged prop values are modeled
//! as a `Value` enum. Collections are Rc-backed, which gives the three
//! comparison strategies watching needs:
//! - reference: identity (`ref_eq`)
//! - collection: shallow structural (`CollectionSnapshot`)
//! - deep: recursive value equality (`deep_eq`)

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

// =============================================================================
// Callback
// =============================================================================

/// A callable scope value.
///
/// Carries the wrapped-in-apply marker so that wrapping is idempotent:
/// wrapping an already-wrapped callback returns the same underlying `Rc`.
#[derive(Clone)]
pub struct Callback {
    func: Rc<dyn Fn(&[Value]) -> Value>,
    wrapped: bool,
}

impl Callback {
    /// Create a plain (unwrapped) callback.
    pub fn new(f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Self {
            func: Rc::new(f),
            wrapped: false,
        }
    }

    /// Create a callback that already carries the wrapped-in-apply marker.
    ///
    /// Only the wrapping step in [`crate::apply`] should need this.
    pub fn already_wrapped(f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Self {
            func: Rc::new(f),
            wrapped: true,
        }
    }

    /// Invoke the callback.
    pub fn call(&self, args: &[Value]) -> Value {
        (self.func)(args)
    }

    /// Whether this callback has already been wrapped in an apply cycle.
    pub fn is_wrapped(&self) -> bool {
        self.wrapped
    }

    /// Identity comparison (same underlying function object).
    pub fn ptr_eq(a: &Callback, b: &Callback) -> bool {
        Rc::ptr_eq(&a.func, &b.func)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("wrapped", &self.wrapped)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Value
// =============================================================================

/// Shared list value.
pub type ValueList = Rc<RefCell<Vec<Value>>>;

/// Shared map value.
pub type ValueMap = Rc<RefCell<IndexMap<String, Value>>>;

/// A dynamically typed scope value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(ValueList),
    Map(ValueMap),
    Func(Callback),
}

impl Value {
    /// Build a string value.
    pub fn str(s: impl AsRef<str>) -> Value {
        Value::Str(Rc::from(s.as_ref()))
    }

    /// Build a shared list value.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    /// Build a shared map value.
    pub fn map(entries: impl IntoIterator<Item = (String, Value)>) -> Value {
        Value::Map(Rc::new(RefCell::new(entries.into_iter().collect())))
    }

    /// Build a callable value.
    pub fn func(f: impl Fn(&[Value]) -> Value + 'static) -> Value {
        Value::Func(Callback::new(f))
    }

    /// Whether this value is callable.
    pub fn is_func(&self) -> bool {
        matches!(self, Value::Func(_))
    }

    /// Identity comparison: scalars by value, collections and callables by
    /// pointer. This is the `reference` watch strategy.
    pub fn ref_eq(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Int(x), Value::Int(y)) => x == y,
            (Value::Float(x), Value::Float(y)) => x == y,
            (Value::Str(x), Value::Str(y)) => x == y,
            (Value::List(x), Value::List(y)) => Rc::ptr_eq(x, y),
            (Value::Map(x), Value::Map(y)) => Rc::ptr_eq(x, y),
            (Value::Func(x), Value::Func(y)) => Callback::ptr_eq(x, y),
            _ => false,
        }
    }

    /// Recursive value equality. This is the `deep` watch strategy.
    ///
    /// Callables still compare by identity (there is no structural equality
    /// for functions).
    pub fn deep_eq(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::List(x), Value::List(y)) => {
                if Rc::ptr_eq(x, y) {
                    return true;
                }
                let (x, y) = (x.borrow(), y.borrow());
                x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| Value::deep_eq(a, b))
            }
            (Value::Map(x), Value::Map(y)) => {
                if Rc::ptr_eq(x, y) {
                    return true;
                }
                let (x, y) = (x.borrow(), y.borrow());
                x.len() == y.len()
                    && x.iter()
                        .all(|(k, v)| y.get(k).is_some_and(|other| Value::deep_eq(v, other)))
            }
            _ => Value::ref_eq(a, b),
        }
    }

    /// Deep copy: fresh Rc for every nested collection.
    ///
    /// Deep watchers must snapshot with this, otherwise in-place mutation of
    /// a shared collection would compare equal to itself.
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::List(items) => Value::list(items.borrow().iter().map(Value::deep_clone)),
            Value::Map(entries) => Value::map(
                entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_clone())),
            ),
            other => other.clone(),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::str(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::str(v)
    }
}

// =============================================================================
// Collection Snapshot
// =============================================================================

/// Shallow structural snapshot of a value, for the `collection` watch
/// strategy: fires on insert/remove/reorder/replace of direct members,
/// not on nested mutation.
#[derive(Clone, Debug)]
pub enum CollectionSnapshot {
    Scalar(Value),
    Items(Vec<Value>),
    Entries(Vec<(String, Value)>),
}

impl CollectionSnapshot {
    /// Take a shallow snapshot (members are captured by identity, not copied).
    pub fn capture(value: &Value) -> Self {
        match value {
            Value::List(items) => CollectionSnapshot::Items(items.borrow().clone()),
            Value::Map(entries) => CollectionSnapshot::Entries(
                entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            other => CollectionSnapshot::Scalar(other.clone()),
        }
    }

    /// Shallow equality against another snapshot.
    pub fn same_as(&self, other: &CollectionSnapshot) -> bool {
        match (self, other) {
            (CollectionSnapshot::Scalar(a), CollectionSnapshot::Scalar(b)) => Value::ref_eq(a, b),
            (CollectionSnapshot::Items(a), CollectionSnapshot::Items(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| Value::ref_eq(x, y))
            }
            (CollectionSnapshot::Entries(a), CollectionSnapshot::Entries(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && Value::ref_eq(va, vb))
            }
            _ => false,
        }
    }
}

// =============================================================================
// Props
// =============================================================================

/// Props object passed to an embedded component. Rebuilt on every render.
pub type PropMap = IndexMap<String, Value>;

/// Convert an evaluated expression into a props object.
///
/// Anything other than a map evaluates to empty props (the expression is
/// expected to produce a props mapping; a missing scope value must not
/// abort the render).
pub fn props_from_value(value: &Value) -> PropMap {
    match value {
        Value::Map(entries) => entries
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        _ => PropMap::new(),
    }
}

// =============================================================================
// Watch Depth
// =============================================================================

/// Comparison strategy for deciding whether a watched expression changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WatchDepth {
    /// Identity change only.
    Reference,
    /// Shallow structural change (insert/remove/reorder of direct members).
    Collection,
    /// Recursive value equality. The safe default: detects nested mutation.
    #[default]
    Deep,
}

impl WatchDepth {
    /// Parse a `watch-depth` attribute value. Anything other than
    /// `reference` or `collection` means deep watching by value.
    pub fn parse(s: &str) -> WatchDepth {
        match s {
            "reference" => WatchDepth::Reference,
            "collection" => WatchDepth::Collection,
            _ => WatchDepth::Deep,
        }
    }
}

// =============================================================================
// Prop Specs
// =============================================================================

/// Per-property configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropConfig {
    /// Override of the adapter-level default watch depth.
    pub watch_depth: Option<WatchDepth>,
    /// Whether callable values of this prop get wrapped in an apply cycle.
    pub wrap_apply: bool,
}

impl Default for PropConfig {
    fn default() -> Self {
        Self {
            watch_depth: None,
            wrap_apply: true,
        }
    }
}

/// A declared prop: a name plus its per-property configuration.
///
/// A bare name carries the default configuration; the `(name, config)` pair
/// form sets overrides.
#[derive(Clone, Debug)]
pub struct PropSpec {
    name: String,
    config: PropConfig,
}

impl PropSpec {
    /// A prop with default configuration.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: PropConfig::default(),
        }
    }

    /// A prop with explicit configuration.
    pub fn with_config(name: impl Into<String>, config: PropConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> PropConfig {
        self.config
    }
}

impl From<&str> for PropSpec {
    fn from(name: &str) -> Self {
        PropSpec::bare(name)
    }
}

// =============================================================================
// Tests
// =============================================================================
