//! Generic adapter - mount any registered component by name.
//!
//! The host element carries everything: `name` (component key), an optional
//! `props` attribute holding one expression that evaluates to a props
//! mapping, and an optional `watch-depth` default override.
//!
//! With a `props` attribute, the first render comes from the watch firing
//! (host convention: registration replays the initial value). Without one,
//! the component renders exactly once with empty props and never again.

use std::rc::Rc;

use tracing::debug;

use super::AdapterHandle;
use crate::apply::apply_functions;
use crate::host::{Attrs, Listener, ScopeHost};
use crate::registry::{Component, ComponentRef, ComponentSource, ResolveError, resolve};
use crate::render::{VRenderer, render_component};
use crate::types::{WatchDepth, props_from_value};
use crate::watch::{WatchSpec, watch_props};

/// Attribute naming the component to mount.
pub const ATTR_NAME: &str = "name";
/// Attribute holding the single props expression.
pub const ATTR_PROPS: &str = "props";
/// Attribute overriding the default watch depth.
pub const ATTR_WATCH_DEPTH: &str = "watch-depth";

// =============================================================================
// Component Mount
// =============================================================================

/// The generic element adapter.
///
/// One instance is registered with the host framework and linked once per
/// element it appears on.
pub struct ComponentMount<R: VRenderer> {
    renderer: Rc<R>,
    sources: Vec<Rc<dyn ComponentSource<R::Tree>>>,
}

impl<R> ComponentMount<R>
where
    R: VRenderer + 'static,
    R::Tree: 'static,
    R::Target: 'static,
{
    pub fn new(renderer: Rc<R>, sources: Vec<Rc<dyn ComponentSource<R::Tree>>>) -> Self {
        Self { renderer, sources }
    }

    /// Attach to a host element.
    ///
    /// Resolves the component once, then either registers watches over the
    /// props expression or renders a single empty-props frame. Fails fast
    /// on a missing or unresolvable `name` attribute; that aborts this
    /// instance only.
    pub fn link(
        &self,
        scope: &Rc<dyn ScopeHost>,
        target: &Rc<R::Target>,
        attrs: &Attrs,
    ) -> Result<AdapterHandle, ResolveError> {
        let reference: ComponentRef<R::Tree> = match attrs.get(ATTR_NAME) {
            Some(name) => ComponentRef::Name(name.to_string()),
            None => return Err(ResolveError::MissingName),
        };
        let component = resolve(&reference, &self.sources)?;

        let default_depth = attrs
            .get(ATTR_WATCH_DEPTH)
            .map(WatchDepth::parse)
            .unwrap_or_default();
        let props_expr = attrs.get(ATTR_PROPS).map(str::to_string);
        debug!(
            props = props_expr.as_deref().unwrap_or(""),
            ?default_depth,
            "linking component mount"
        );

        let rerender = self.rerender_listener(&component, scope, target, props_expr.clone());

        let watches = match props_expr {
            // Re-render on every change of the props expression. The first
            // render arrives with the watch's initial firing.
            Some(expr) => watch_props(default_depth, scope, &[WatchSpec::bare(expr)], rerender),
            // No props: one immediate render, never again.
            None => {
                rerender();
                Vec::new()
            }
        };

        Ok(AdapterHandle::new(watches))
    }

    /// The shared rebuild-and-render listener: evaluate the props
    /// expression, wrap callbacks, schedule a full remount.
    fn rerender_listener(
        &self,
        component: &Component<R::Tree>,
        scope: &Rc<dyn ScopeHost>,
        target: &Rc<R::Target>,
        props_expr: Option<String>,
    ) -> Listener {
        let renderer = Rc::clone(&self.renderer);
        let component = component.clone();
        let scope = Rc::clone(scope);
        let target = Rc::clone(target);

        Rc::new(move || {
            let scope_props = props_expr
                .as_deref()
                .map(|expr| props_from_value(&scope.eval(expr)))
                .unwrap_or_default();
            let props = apply_functions(&scope_props, &scope, &Default::default());
            render_component(&renderer, &component, props, &scope, &target);
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{RenderTarget, TestRenderer, TestScope};
    use crate::host::HostCaps;
    use crate::registry::MapSource;
    use crate::types::{PropMap, Value};

    fn hello_mount() -> ComponentMount<TestRenderer> {
        let hello = Component::new(|props: &PropMap| match props.get("name") {
            Some(Value::Str(name)) => format!("Hello {name}"),
            _ => "Hello nobody".to_string(),
        });
        let source = MapSource::new().with("Hello", hello);
        ComponentMount::new(Rc::new(TestRenderer), vec![Rc::new(source)])
    }

    #[test]
    fn missing_name_fails_fast() {
        let mount = hello_mount();
        let scope = TestScope::new(HostCaps::all());
        let host: Rc<dyn ScopeHost> = scope.clone();
        let target = RenderTarget::new();

        let err = mount.link(&host, &target, &Attrs::new()).unwrap_err();
        assert_eq!(err, ResolveError::MissingName);

        let err = mount
            .link(&host, &target, &Attrs::new().with("name", "Nope"))
            .unwrap_err();
        assert_eq!(err, ResolveError::NotFound("Nope".to_string()));
    }

    #[test]
    fn without_props_renders_once_with_empty_props() {
        let mount = hello_mount();
        let scope = TestScope::new(HostCaps::all());
        let host: Rc<dyn ScopeHost> = scope.clone();
        let target = RenderTarget::new();

        let handle = mount
            .link(&host, &target, &Attrs::new().with("name", "Hello"))
            .unwrap();
        assert_eq!(handle.watch_count(), 0);

        // The render was scheduled, not performed synchronously.
        assert_eq!(target.frame_count(), 0);
        scope.digest();
        assert_eq!(target.frames(), vec!["Hello nobody".to_string()]);

        // Scope churn never re-renders a props-less mount.
        scope.set("anything", Value::Int(1));
        scope.digest();
        assert_eq!(target.frame_count(), 1);
    }

    #[test]
    fn with_props_first_render_comes_from_the_watch() {
        let mount = hello_mount();
        let scope = TestScope::new(HostCaps::all());
        let host: Rc<dyn ScopeHost> = scope.clone();
        let target = RenderTarget::new();

        scope.set("view", Value::map([("name".to_string(), Value::str("A"))]));
        let handle = mount
            .link(
                &host,
                &target,
                &Attrs::new().with("name", "Hello").with("props", "view"),
            )
            .unwrap();
        assert_eq!(handle.watch_count(), 1);

        // Nothing rendered until the watch fires for the first time.
        assert_eq!(target.frame_count(), 0);
        scope.digest();
        assert_eq!(target.frames(), vec!["Hello A".to_string()]);

        scope.set("view", Value::map([("name".to_string(), Value::str("B"))]));
        scope.digest();
        assert_eq!(
            target.frames(),
            vec!["Hello A".to_string(), "Hello B".to_string()]
        );
    }

    #[test]
    fn unmount_detaches_the_watch() {
        let mount = hello_mount();
        let scope = TestScope::new(HostCaps::all());
        let host: Rc<dyn ScopeHost> = scope.clone();
        let target = RenderTarget::new();

        scope.set("view", Value::map([("name".to_string(), Value::str("A"))]));
        let handle = mount
            .link(
                &host,
                &target,
                &Attrs::new().with("name", "Hello").with("props", "view"),
            )
            .unwrap();
        scope.digest();
        assert_eq!(target.frame_count(), 1);

        handle.unmount();
        scope.set("view", Value::map([("name".to_string(), Value::str("B"))]));
        scope.digest();
        assert_eq!(target.frame_count(), 1);
    }
}
