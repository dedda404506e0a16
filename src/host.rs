//! Host framework abstraction.
//!
//! The bridge never talks to a concrete host framework. It consumes:
//! - [`ScopeHost`] - expression evaluation, watch registration, the
//!   change-detection phase query, `apply`, and deferred scheduling
//! - [`HostCaps`] - a statically declared capability descriptor for the
//!   optional watch primitives (no run-time probing)
//! - [`Attrs`] - the attribute set present on the host element at link time
//!
//! Every watch registration returns a [`WatchHandle`]; disposing it (or
//! dropping it) unsubscribes the listener.

use std::rc::Rc;

use bitflags::bitflags;
use indexmap::IndexMap;

// =============================================================================
// Capabilities
// =============================================================================

bitflags! {
    /// Optional watch primitives a host supports.
    ///
    /// Declared up front by whatever adapter wraps the host framework.
    /// Watch registration degrades to individual watches for anything
    /// not declared here.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HostCaps: u8 {
        /// Shallow collection watching (`watch_collection`).
        const WATCH_COLLECTION = 1 << 0;
        /// Batched multi-expression watching (`watch_group`).
        const WATCH_GROUP = 1 << 1;
    }
}

// =============================================================================
// Watch Handle
// =============================================================================

/// Change listener fired by the host when a watched expression changes.
pub type Listener = Rc<dyn Fn()>;

/// Disposal handle for one watch registration.
///
/// Dropping the handle unsubscribes the listener, so an adapter that owns
/// its handles releases every registration when it is torn down.
#[must_use = "dropping the handle unsubscribes the listener"]
pub struct WatchHandle {
    dispose: Option<Box<dyn FnOnce()>>,
}

impl WatchHandle {
    /// Wrap an unsubscribe function.
    pub fn new(dispose: impl FnOnce() + 'static) -> Self {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    /// A handle with nothing to release.
    pub fn noop() -> Self {
        Self { dispose: None }
    }

    /// Unsubscribe now. Equivalent to dropping the handle.
    pub fn dispose(mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

// =============================================================================
// Scope Host
// =============================================================================

/// The host framework's scope, as the bridge sees it.
///
/// Single-threaded and event-loop driven: all methods are invoked from the
/// host's own change-detection machinery, and implementations hand out
/// `Rc`-shared state rather than synchronizing.
pub trait ScopeHost {
    /// The statically declared optional-capability set.
    fn capabilities(&self) -> HostCaps;

    /// Evaluate an expression against the scope.
    fn eval(&self, expr: &str) -> crate::types::Value;

    /// Whether execution is currently inside a change-detection cycle.
    fn in_cycle(&self) -> bool;

    /// Run `body` inside a change-detection cycle and return its result.
    ///
    /// Idempotent: when already inside a cycle the body runs directly,
    /// no nested cycle is started.
    fn apply(&self, body: Box<dyn FnOnce() -> crate::types::Value>) -> crate::types::Value;

    /// Defer `task` until the current cycle's data-bound expressions have
    /// settled (before the host proceeds past the current pass).
    fn schedule(&self, task: Box<dyn FnOnce()>);

    /// Watch a single expression. `deep` selects recursive value equality;
    /// otherwise the comparison is by identity.
    fn watch(&self, expr: &str, deep: bool, listener: Listener) -> WatchHandle;

    /// Watch a single expression with shallow collection comparison.
    ///
    /// Only called when [`HostCaps::WATCH_COLLECTION`] is declared. The
    /// default falls back to a deep watch for hosts that declare the
    /// capability through a wrapper.
    fn watch_collection(&self, expr: &str, listener: Listener) -> WatchHandle {
        self.watch(expr, true, listener)
    }

    /// Watch several expressions with one shared registration, comparing
    /// each by identity.
    ///
    /// Only called when [`HostCaps::WATCH_GROUP`] is declared. The default
    /// registers individual shallow watches.
    fn watch_group(&self, exprs: &[String], listener: Listener) -> WatchHandle {
        let handles: Vec<WatchHandle> = exprs
            .iter()
            .map(|expr| self.watch(expr, false, listener.clone()))
            .collect();
        WatchHandle::new(move || drop(handles))
    }
}

// =============================================================================
// Attrs
// =============================================================================

/// Attribute set present on a host-managed element at link time.
///
/// Maps attribute names to the bound expression strings the host framework
/// parsed out of the markup. Insertion order is preserved, which makes the
/// case-insensitive "first match wins" lookup deterministic.
#[derive(Clone, Debug, Default)]
pub struct Attrs {
    entries: IndexMap<String, String>,
}

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    pub fn with(mut self, name: impl Into<String>, expr: impl Into<String>) -> Self {
        self.entries.insert(name.into(), expr.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, expr: impl Into<String>) {
        self.entries.insert(name.into(), expr.into());
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Case-insensitive lookup for a prop name. At most one match is used;
    /// the first attribute (in insertion order) wins.
    pub fn find(&self, prop_name: &str) -> Option<&str> {
        let wanted = prop_name.to_lowercase();
        self.entries
            .iter()
            .find(|(name, _)| name.to_lowercase() == wanted)
            .map(|(_, expr)| expr.as_str())
    }

    /// All attribute names, in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn attrs_find_is_case_insensitive_first_match_wins() {
        let attrs = Attrs::new()
            .with("USERNAME", "a")
            .with("username", "b")
            .with("other", "c");

        assert_eq!(attrs.find("userName"), Some("a"));
        assert_eq!(attrs.find("OTHER"), Some("c"));
        assert_eq!(attrs.find("missing"), None);
    }

    #[test]
    fn watch_handle_disposes_once() {
        let count = Rc::new(Cell::new(0));

        let counted = count.clone();
        let handle = WatchHandle::new(move || counted.set(counted.get() + 1));
        handle.dispose();
        assert_eq!(count.get(), 1);

        let counted = count.clone();
        drop(WatchHandle::new(move || counted.set(counted.get() + 1)));
        assert_eq!(count.get(), 2);

        WatchHandle::noop().dispose();
        assert_eq!(count.get(), 2);
    }
}
