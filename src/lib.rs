//! # spark-bridge
//!
//! Mount virtual-DOM components inside scope-based reactive host frameworks.
//!
//! A host framework owns a mutable scope, watches expressions against it,
//! and runs change-detection cycles. An embedded component is a pure
//! function from props to a virtual-DOM tree, rendered by an external
//! renderer. This crate is the glue between the two:
//!
//! ```text
//! host attaches adapter -> resolve component -> watch scope expressions
//!   -> on change: rebuild props (wrap callbacks) -> schedule full remount
//! ```
//!
//! Both collaborators stay opaque: the host behind [`ScopeHost`] (with a
//! statically declared [`HostCaps`] capability set), the renderer behind
//! [`VRenderer`]. The crate never diffs trees and never reaches into host
//! internals.
//!
//! ## Modules
//!
//! - [`types`] - scope values, callbacks, props, watch depths
//! - [`host`] - host framework abstraction (scope, capabilities, attrs)
//! - [`registry`] - component resolution through ordered sources
//! - [`apply`] - callback wrapping into change-detection cycles
//! - [`watch`] - watch-depth selection and registration
//! - [`render`] - renderer abstraction and the deferred mount step
//! - [`adapter`] - the two entry points: generic mount and directive factory
//! - [`harness`] - in-process host/renderer doubles for tests

pub mod adapter;
pub mod apply;
pub mod harness;
pub mod host;
pub mod registry;
pub mod render;
pub mod types;
pub mod watch;

// Re-export commonly used items
pub use types::{
    Callback, CollectionSnapshot, PropConfig, PropMap, PropSpec, Value, WatchDepth,
    props_from_value,
};

pub use host::{Attrs, HostCaps, Listener, ScopeHost, WatchHandle};

pub use registry::{
    Component, ComponentRef, ComponentSource, MapSource, NamespaceSource, ResolveError, resolve,
};

pub use apply::{applied, apply_functions};

pub use watch::{WatchSpec, watch_props};

pub use render::{VRenderer, render_component};

pub use adapter::{
    ATTR_NAME, ATTR_PROPS, ATTR_WATCH_DEPTH, AdapterHandle, ComponentMount, Directive,
    DirectiveConfig, DirectiveFactory,
};
