//! Test harness - in-process doubles for the two external collaborators.
//!
//! - [`TestScope`] - a minimal dirty-checking scope implementing
//!   [`crate::host::ScopeHost`] with configurable capabilities, an explicit
//!   `digest()`, and a registration log
//! - [`TestRenderer`] / [`RenderTarget`] - a recording renderer that keeps
//!   every mounted frame
//!
//! The harness exists for this crate's tests and for downstream consumers'
//! tests. It is not a host-framework implementation: expression support
//! stops at dotted paths and simple literals.

mod render;
mod scope;

pub use render::{RenderTarget, TestRenderer};
pub use scope::{Registration, TestScope};
