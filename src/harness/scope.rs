//! A minimal dirty-checking scope for tests.
//!
//! Implements the full [`ScopeHost`] surface: watchers with the three
//! comparison strategies, grouped registration, an apply/digest cycle with
//! a settle queue, and disposal. Watchers fire on their first digest after
//! registration (the registration replays the initial value), matching the
//! host convention the adapters rely on.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::host::{HostCaps, Listener, ScopeHost, WatchHandle};
use crate::types::{CollectionSnapshot, Value};

/// A digest that keeps finding changes after this many passes is unstable.
const MAX_PASSES: usize = 10;

// =============================================================================
// Watchers
// =============================================================================

/// What a watch registration looked like, for assertions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    /// Individual watch, recursive value equality.
    Deep,
    /// Individual watch, identity comparison.
    Shallow,
    /// Shallow collection watch.
    Collection,
    /// Batched watch over this many expressions.
    Group(usize),
}

#[derive(Clone)]
enum Strategy {
    Single { expr: String, deep: bool },
    Collection { expr: String },
    Group { exprs: Vec<String> },
}

#[derive(Clone)]
enum Snapshot {
    Deep(Value),
    Ref(Value),
    Collection(CollectionSnapshot),
    Group(Vec<Value>),
}

impl Snapshot {
    fn same_as(&self, other: &Snapshot) -> bool {
        match (self, other) {
            (Snapshot::Deep(a), Snapshot::Deep(b)) => Value::deep_eq(a, b),
            (Snapshot::Ref(a), Snapshot::Ref(b)) => Value::ref_eq(a, b),
            (Snapshot::Collection(a), Snapshot::Collection(b)) => a.same_as(b),
            (Snapshot::Group(a), Snapshot::Group(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| Value::ref_eq(x, y))
            }
            _ => false,
        }
    }
}

struct Watcher {
    strategy: Strategy,
    listener: Listener,
    alive: Rc<Cell<bool>>,
    last: Option<Snapshot>,
}

// =============================================================================
// Test Scope
// =============================================================================

/// In-process scope double with explicit digest control.
pub struct TestScope {
    caps: HostCaps,
    vars: RefCell<IndexMap<String, Value>>,
    watchers: RefCell<Vec<Watcher>>,
    queue: RefCell<VecDeque<Box<dyn FnOnce()>>>,
    in_cycle: Cell<bool>,
    cycles: Cell<usize>,
    log: RefCell<Vec<Registration>>,
}

impl TestScope {
    pub fn new(caps: HostCaps) -> Rc<Self> {
        Rc::new(Self {
            caps,
            vars: RefCell::new(IndexMap::new()),
            watchers: RefCell::new(Vec::new()),
            queue: RefCell::new(VecDeque::new()),
            in_cycle: Cell::new(false),
            cycles: Cell::new(0),
            log: RefCell::new(Vec::new()),
        })
    }

    /// Set a scope variable. Takes effect on the next digest.
    pub fn set(&self, name: &str, value: impl Into<Value>) {
        self.vars.borrow_mut().insert(name.to_string(), value.into());
    }

    /// Read a scope variable.
    pub fn get(&self, name: &str) -> Value {
        self.vars.borrow().get(name).cloned().unwrap_or(Value::Null)
    }

    /// Run one change-detection cycle: drain scheduled tasks and fire
    /// watchers until everything settles.
    pub fn digest(&self) {
        if self.in_cycle.get() {
            return;
        }
        self.in_cycle.set(true);
        self.cycles.set(self.cycles.get() + 1);
        self.run_cycle();
        self.in_cycle.set(false);
    }

    /// How many change-detection cycles have run.
    pub fn cycles(&self) -> usize {
        self.cycles.get()
    }

    /// Every watch registration made against this scope, in order.
    pub fn registrations(&self) -> Vec<Registration> {
        self.log.borrow().clone()
    }

    /// Live (not yet disposed) watcher count.
    pub fn live_watchers(&self) -> usize {
        self.watchers.borrow().iter().filter(|w| w.alive.get()).count()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn register(&self, strategy: Strategy, listener: Listener, entry: Registration) -> WatchHandle {
        let alive = Rc::new(Cell::new(true));
        self.watchers.borrow_mut().push(Watcher {
            strategy,
            listener,
            alive: alive.clone(),
            last: None,
        });
        self.log.borrow_mut().push(entry);
        WatchHandle::new(move || alive.set(false))
    }

    fn capture(&self, strategy: &Strategy) -> Snapshot {
        match strategy {
            Strategy::Single { expr, deep: true } => Snapshot::Deep(self.eval(expr).deep_clone()),
            Strategy::Single { expr, deep: false } => Snapshot::Ref(self.eval(expr)),
            Strategy::Collection { expr } => {
                Snapshot::Collection(CollectionSnapshot::capture(&self.eval(expr)))
            }
            Strategy::Group { exprs } => {
                Snapshot::Group(exprs.iter().map(|expr| self.eval(expr)).collect())
            }
        }
    }

    fn run_cycle(&self) {
        for _ in 0..MAX_PASSES {
            let ran = self.drain_queue();
            let dirty = self.check_watchers();
            if !ran && !dirty && self.queue.borrow().is_empty() {
                return;
            }
        }
        panic!("digest did not settle after {MAX_PASSES} passes");
    }

    fn drain_queue(&self) -> bool {
        let mut ran = false;
        loop {
            let task = self.queue.borrow_mut().pop_front();
            match task {
                Some(task) => {
                    ran = true;
                    task();
                }
                None => break,
            }
        }
        ran
    }

    fn check_watchers(&self) -> bool {
        let mut dirty = false;
        let mut index = 0;
        loop {
            // Listeners may register watchers or schedule tasks, so borrows
            // are released before firing.
            let fired = {
                let watchers = self.watchers.borrow();
                let Some(watcher) = watchers.get(index) else {
                    break;
                };
                if !watcher.alive.get() {
                    None
                } else {
                    let current = self.capture(&watcher.strategy);
                    let changed = watcher
                        .last
                        .as_ref()
                        .is_none_or(|previous| !previous.same_as(&current));
                    changed.then(|| (current, watcher.listener.clone()))
                }
            };
            if let Some((current, listener)) = fired {
                self.watchers.borrow_mut()[index].last = Some(current);
                dirty = true;
                listener();
            }
            index += 1;
        }
        dirty
    }
}

impl ScopeHost for TestScope {
    fn capabilities(&self) -> HostCaps {
        self.caps
    }

    /// Dotted-path lookup into scope variables, plus integer and
    /// single-quoted string literals.
    fn eval(&self, expr: &str) -> Value {
        let expr = expr.trim();
        if let Some(inner) = expr
            .strip_prefix('\'')
            .and_then(|rest| rest.strip_suffix('\''))
        {
            return Value::str(inner);
        }
        if let Ok(n) = expr.parse::<i64>() {
            return Value::Int(n);
        }

        let mut parts = expr.split('.');
        let Some(first) = parts.next() else {
            return Value::Null;
        };
        let mut current = self.get(first);
        for part in parts {
            current = match current {
                Value::Map(entries) => {
                    entries.borrow().get(part).cloned().unwrap_or(Value::Null)
                }
                _ => Value::Null,
            };
        }
        current
    }

    fn in_cycle(&self) -> bool {
        self.in_cycle.get()
    }

    fn apply(&self, body: Box<dyn FnOnce() -> Value>) -> Value {
        if self.in_cycle.get() {
            return body();
        }
        self.in_cycle.set(true);
        self.cycles.set(self.cycles.get() + 1);
        let out = body();
        self.run_cycle();
        self.in_cycle.set(false);
        out
    }

    fn schedule(&self, task: Box<dyn FnOnce()>) {
        // Runs once the current (or next) digest drains the settle queue.
        self.queue.borrow_mut().push_back(task);
    }

    fn watch(&self, expr: &str, deep: bool, listener: Listener) -> WatchHandle {
        let entry = if deep {
            Registration::Deep
        } else {
            Registration::Shallow
        };
        self.register(
            Strategy::Single {
                expr: expr.to_string(),
                deep,
            },
            listener,
            entry,
        )
    }

    fn watch_collection(&self, expr: &str, listener: Listener) -> WatchHandle {
        self.register(
            Strategy::Collection {
                expr: expr.to_string(),
            },
            listener,
            Registration::Collection,
        )
    }

    fn watch_group(&self, exprs: &[String], listener: Listener) -> WatchHandle {
        self.register(
            Strategy::Group {
                exprs: exprs.to_vec(),
            },
            listener,
            Registration::Group(exprs.len()),
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fired_counter(scope: &Rc<TestScope>, expr: &str, deep: bool) -> Rc<Cell<usize>> {
        let count = Rc::new(Cell::new(0));
        let counted = count.clone();
        let host: Rc<dyn ScopeHost> = scope.clone();
        // Handle leaked on purpose: these tests want the watch alive for
        // the scope's lifetime.
        std::mem::forget(host.watch(
            expr,
            deep,
            Rc::new(move || counted.set(counted.get() + 1)),
        ));
        count
    }

    #[test]
    fn watcher_fires_on_first_digest_and_on_change() {
        let scope = TestScope::new(HostCaps::all());
        scope.set("x", Value::Int(1));
        let fired = fired_counter(&scope, "x", true);

        scope.digest();
        assert_eq!(fired.get(), 1);

        // No change: no fire.
        scope.digest();
        assert_eq!(fired.get(), 1);

        scope.set("x", Value::Int(2));
        scope.digest();
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn deep_watch_sees_in_place_mutation_shallow_does_not() {
        let scope = TestScope::new(HostCaps::all());
        let list = Value::list([Value::Int(1)]);
        scope.set("xs", list.clone());

        let deep = fired_counter(&scope, "xs", true);
        let shallow = fired_counter(&scope, "xs", false);
        scope.digest();
        assert_eq!((deep.get(), shallow.get()), (1, 1));

        if let Value::List(items) = &list {
            items.borrow_mut().push(Value::Int(2));
        }
        scope.digest();
        assert_eq!((deep.get(), shallow.get()), (2, 1));
    }

    #[test]
    fn dotted_path_and_literals_evaluate() {
        let scope = TestScope::new(HostCaps::all());
        scope.set(
            "user",
            Value::map([("name".to_string(), Value::str("Ada"))]),
        );

        let host: Rc<dyn ScopeHost> = scope.clone();
        assert!(matches!(host.eval("user.name"), Value::Str(s) if &*s == "Ada"));
        assert!(matches!(host.eval("user.missing"), Value::Null));
        assert!(matches!(host.eval("'lit'"), Value::Str(s) if &*s == "lit"));
        assert!(matches!(host.eval("42"), Value::Int(42)));
    }

    #[test]
    fn disposed_watcher_never_fires_again() {
        let scope = TestScope::new(HostCaps::all());
        scope.set("x", Value::Int(1));

        let count = Rc::new(Cell::new(0));
        let counted = count.clone();
        let host: Rc<dyn ScopeHost> = scope.clone();
        let handle = host.watch("x", true, Rc::new(move || counted.set(counted.get() + 1)));

        scope.digest();
        assert_eq!(count.get(), 1);

        handle.dispose();
        assert_eq!(scope.live_watchers(), 0);
        scope.set("x", Value::Int(2));
        scope.digest();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn scheduled_tasks_run_inside_the_digest() {
        let scope = TestScope::new(HostCaps::all());
        let host: Rc<dyn ScopeHost> = scope.clone();

        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        host.schedule(Box::new(move || flag.set(true)));
        assert!(!ran.get());

        scope.digest();
        assert!(ran.get());
    }

    #[test]
    fn unstable_digest_panics() {
        let scope = TestScope::new(HostCaps::all());
        scope.set("x", Value::Int(0));

        let host: Rc<dyn ScopeHost> = scope.clone();
        let bump = scope.clone();
        std::mem::forget(host.watch(
            "x",
            true,
            Rc::new(move || {
                // Every firing changes the watched value again.
                let next = match bump.get("x") {
                    Value::Int(n) => n + 1,
                    _ => 0,
                };
                bump.set("x", Value::Int(next));
            }),
        ));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| scope.digest()));
        assert!(result.is_err());
    }
}
