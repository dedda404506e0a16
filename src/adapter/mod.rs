//! Adapter entry points.
//!
//! Two ways to put an embedded component under host control:
//! - [`ComponentMount`] - the generic adapter: component name and an
//!   optional single props expression read from element attributes
//! - [`DirectiveFactory`] - builds reusable adapters for one component
//!   with a declared prop list, static configuration, and injected props
//!
//! Linking either one returns an [`AdapterHandle`] that owns every watch
//! registration made on the instance's behalf.

mod component_mount;
mod directive;

pub use component_mount::{ATTR_NAME, ATTR_PROPS, ATTR_WATCH_DEPTH, ComponentMount};
pub use directive::{Directive, DirectiveConfig, DirectiveFactory};

use crate::host::WatchHandle;

// =============================================================================
// Adapter Handle
// =============================================================================

/// Handle for one linked adapter instance.
///
/// Owns the instance's watch registrations. Unmounting (or dropping the
/// handle) disposes all of them together, detaching the instance from the
/// host scope. Renders already scheduled are not cancelled; they run once
/// and nothing re-schedules after that.
#[must_use = "dropping the handle detaches the adapter from the host scope"]
pub struct AdapterHandle {
    watches: Vec<WatchHandle>,
}

impl AdapterHandle {
    pub(crate) fn new(watches: Vec<WatchHandle>) -> Self {
        Self { watches }
    }

    /// Number of live watch registrations owned by this instance.
    pub fn watch_count(&self) -> usize {
        self.watches.len()
    }

    /// Detach from the host scope, releasing every watch registration.
    pub fn unmount(mut self) {
        for watch in self.watches.drain(..) {
            watch.dispose();
        }
    }
}

impl std::fmt::Debug for AdapterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterHandle")
            .field("watches", &self.watches.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_debug_reports_watch_count() {
        let handle = AdapterHandle::new(vec![WatchHandle::noop(), WatchHandle::noop()]);
        let rendered = format!("{handle:?}");
        assert!(rendered.contains("watches: 2"));
        handle.unmount();
    }
}
