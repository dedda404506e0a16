//! Render step - the single funnel from props to a mounted tree.
//!
//! Full remount on every relevant change is the policy here. The bridge
//! never diffs against the previous mount; incremental updates are the
//! embedded renderer's business.

use std::rc::Rc;

use crate::host::ScopeHost;
use crate::registry::Component;
use crate::types::PropMap;

// =============================================================================
// Renderer
// =============================================================================

/// The embedded virtual-DOM renderer, as the bridge sees it.
pub trait VRenderer {
    /// Virtual-DOM tree produced by components.
    type Tree;
    /// Host mount point a tree is rendered onto.
    type Target;

    /// Mount `tree` at `target`, replacing any prior output there.
    fn mount(&self, tree: Self::Tree, target: &Self::Target);
}

// =============================================================================
// Render
// =============================================================================

/// Schedule a fresh mount of `component(props)` onto `target`.
///
/// The mount is deferred through the host's settle boundary
/// ([`ScopeHost::schedule`]), so several scope mutations within one
/// change-detection pass coalesce into one render instead of firing
/// mid-cycle.
pub fn render_component<R>(
    renderer: &Rc<R>,
    component: &Component<R::Tree>,
    props: PropMap,
    scope: &Rc<dyn ScopeHost>,
    target: &Rc<R::Target>,
) where
    R: VRenderer + 'static,
    R::Tree: 'static,
    R::Target: 'static,
{
    let renderer = Rc::clone(renderer);
    let component = component.clone();
    let target = Rc::clone(target);
    scope.schedule(Box::new(move || {
        renderer.mount(component.render(&props), &target);
    }));
}
