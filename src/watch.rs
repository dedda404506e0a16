//! Watch registration - mapping prop specs onto host watch primitives.
//!
//! Effective depth per expression: per-prop override, else the adapter
//! default, else deep. Reference-depth expressions are coalesced into one
//! batched registration when the host declares group watching - one
//! registration covering any of them changing, which keeps the number of
//! independent watches down on hosts where that matters.

use std::rc::Rc;

use tracing::trace;

use crate::host::{HostCaps, Listener, ScopeHost, WatchHandle};
use crate::types::{PropConfig, WatchDepth};

// =============================================================================
// Watch Specs
// =============================================================================

/// One expression to watch, with the per-prop configuration it came from.
#[derive(Clone, Debug)]
pub struct WatchSpec {
    pub expr: String,
    pub config: PropConfig,
}

impl WatchSpec {
    /// An expression watched with default configuration.
    pub fn bare(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            config: PropConfig::default(),
        }
    }

    /// An expression with explicit per-prop configuration.
    pub fn with_config(expr: impl Into<String>, config: PropConfig) -> Self {
        Self {
            expr: expr.into(),
            config,
        }
    }
}

// =============================================================================
// Registration
// =============================================================================

/// Register watches for every expression, funneling all of them into the
/// same listener (a total rebuild-and-render, never a per-prop patch).
///
/// Strategy per expression:
/// - collection depth, host declares `WATCH_COLLECTION` -> collection watch
/// - reference depth, host declares `WATCH_GROUP` -> deferred into one
///   batched registration shared by all reference-depth expressions
/// - everything else -> individual watch, deep unless the depth is
///   reference
pub fn watch_props(
    default_depth: WatchDepth,
    scope: &Rc<dyn ScopeHost>,
    specs: &[WatchSpec],
    listener: Listener,
) -> Vec<WatchHandle> {
    let caps = scope.capabilities();
    let mut handles = Vec::new();
    let mut group: Vec<String> = Vec::new();

    for spec in specs {
        let depth = spec.config.watch_depth.unwrap_or(default_depth);
        match depth {
            WatchDepth::Collection if caps.contains(HostCaps::WATCH_COLLECTION) => {
                trace!(expr = spec.expr.as_str(), "collection watch");
                handles.push(scope.watch_collection(&spec.expr, listener.clone()));
            }
            WatchDepth::Reference if caps.contains(HostCaps::WATCH_GROUP) => {
                group.push(spec.expr.clone());
            }
            depth => {
                let deep = depth != WatchDepth::Reference;
                trace!(expr = spec.expr.as_str(), deep, "individual watch");
                handles.push(scope.watch(&spec.expr, deep, listener.clone()));
            }
        }
    }

    if !group.is_empty() {
        trace!(exprs = group.len(), "group watch");
        handles.push(scope.watch_group(&group, listener));
    }

    handles
}

// =============================================================================
// Tests
// =============================================================================
