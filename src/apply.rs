//! Callback wrapping - keeping embedded-component callbacks inside the
//! host's change-detection cycle.
//!
//! Callbacks handed to an embedded component fire outside the host's own
//! event handling. Unwrapped, any scope mutation they make would sit
//! invisible until the next unrelated cycle. Wrapping guarantees exactly
//! one cycle per invocation: never zero, and never a nested cycle when the
//! call already happens mid-cycle.

use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;

use crate::host::ScopeHost;
use crate::types::{Callback, PropConfig, PropMap, Value};

// =============================================================================
// Wrapping
// =============================================================================

/// Wrap a callback so invoking it runs inside a host change-detection cycle.
///
/// Idempotent: a callback that already carries the wrapped marker is
/// returned unchanged (same underlying function object). Otherwise the
/// returned callback checks the current phase on every invocation - inside
/// a cycle it calls through directly, outside it asks the host to run one
/// cycle whose body is the call, propagating the return value.
pub fn applied(callback: &Callback, scope: &Rc<dyn ScopeHost>) -> Callback {
    if callback.is_wrapped() {
        return callback.clone();
    }

    let inner = callback.clone();
    let scope = Rc::clone(scope);
    Callback::already_wrapped(move |args: &[Value]| {
        if scope.in_cycle() {
            inner.call(args)
        } else {
            let inner = inner.clone();
            let args = args.to_vec();
            scope.apply(Box::new(move || inner.call(&args)))
        }
    })
}

/// Wrap every callable prop value, honoring per-prop opt-out.
///
/// Pure: the input map is left untouched, a new map is returned. Values
/// that are not callable, and callables whose prop config sets
/// `wrap_apply: false`, pass through unchanged.
pub fn apply_functions(
    props: &PropMap,
    scope: &Rc<dyn ScopeHost>,
    config: &IndexMap<String, PropConfig>,
) -> PropMap {
    props
        .iter()
        .map(|(name, value)| {
            let wrap = config.get(name).map(|c| c.wrap_apply).unwrap_or(true);
            let value = match value {
                Value::Func(callback) if wrap => {
                    trace!(prop = name.as_str(), "wrapping callback prop");
                    Value::Func(applied(callback, scope))
                }
                other => other.clone(),
            };
            (name.clone(), value)
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::TestScope;
    use crate::host::HostCaps;
    use proptest::prelude::*;
    use std::cell::Cell;

    fn scope() -> Rc<dyn ScopeHost> {
        TestScope::new(HostCaps::all())
    }

    #[test]
    fn wrapping_is_idempotent() {
        let scope = scope();
        let callback = Callback::new(|_| Value::Null);

        let once = applied(&callback, &scope);
        let twice = applied(&once, &scope);

        assert!(once.is_wrapped());
        assert!(Callback::ptr_eq(&once, &twice));
        assert!(!Callback::ptr_eq(&callback, &once));
    }

    #[test]
    fn outside_cycle_runs_exactly_one_cycle() {
        let scope = TestScope::new(HostCaps::all());
        let host: Rc<dyn ScopeHost> = scope.clone();

        let wrapped = applied(&Callback::new(|args| args[0].clone()), &host);
        let out = wrapped.call(&[Value::Int(7)]);

        // Return value propagates through the cycle.
        assert!(matches!(out, Value::Int(7)));
        assert_eq!(scope.cycles(), 1);
    }

    #[test]
    fn inside_cycle_calls_through_without_nesting() {
        let scope = TestScope::new(HostCaps::all());
        let host: Rc<dyn ScopeHost> = scope.clone();

        let calls = Rc::new(Cell::new(0));
        let counted = calls.clone();
        let wrapped = applied(
            &Callback::new(move |_| {
                counted.set(counted.get() + 1);
                Value::Null
            }),
            &host,
        );

        // Invoke from inside a cycle: the body must run directly, with no
        // second cycle started by the wrapper.
        let inner = wrapped.clone();
        host.apply(Box::new(move || inner.call(&[])));

        assert_eq!(calls.get(), 1);
        assert_eq!(scope.cycles(), 1);
    }

    #[test]
    fn apply_functions_wraps_selectively() {
        let scope = scope();
        let callback = Callback::new(|_| Value::Null);
        let opted_out = Callback::new(|_| Value::Null);

        let mut props = PropMap::new();
        props.insert("plain".to_string(), Value::Int(1));
        props.insert("cb".to_string(), Value::Func(callback.clone()));
        props.insert("raw".to_string(), Value::Func(opted_out.clone()));

        let mut config = IndexMap::new();
        config.insert(
            "raw".to_string(),
            PropConfig {
                wrap_apply: false,
                ..Default::default()
            },
        );

        let out = apply_functions(&props, &scope, &config);

        // Identical key set, input untouched.
        assert_eq!(
            out.keys().collect::<Vec<_>>(),
            props.keys().collect::<Vec<_>>()
        );
        assert!(matches!(props.get("cb"), Some(Value::Func(c)) if !c.is_wrapped()));

        assert!(matches!(out.get("plain"), Some(Value::Int(1))));
        assert!(
            matches!(out.get("cb"), Some(Value::Func(c)) if c.is_wrapped() && !Callback::ptr_eq(c, &callback))
        );
        assert!(
            matches!(out.get("raw"), Some(Value::Func(c)) if Callback::ptr_eq(c, &opted_out))
        );
    }

    proptest! {
        #[test]
        fn apply_functions_preserves_keys_and_plain_values(
            entries in proptest::collection::vec(("[a-z]{1,8}", any::<i64>()), 0..8)
        ) {
            let scope = scope();
            let props: PropMap = entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::Int(*v)))
                .collect();

            let out = apply_functions(&props, &scope, &IndexMap::new());

            prop_assert_eq!(out.len(), props.len());
            for (key, value) in &props {
                let passed = out.get(key).expect("key preserved");
                prop_assert!(Value::ref_eq(passed, value));
            }
        }
    }
}
