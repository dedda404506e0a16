//! Adapter generator - purpose-built adapters for one component.
//!
//! Where [`super::ComponentMount`] reads everything from attributes at link
//! time, a generated [`Directive`] is parameterized up front: component
//! reference, declared prop list, static configuration, and a fixed set of
//! injected props merged into every render.
//!
//! Unlike the generic adapter, a directive always renders one initial frame
//! at link time, independent of the first watch firing. That asymmetry is
//! part of the observed contract and deliberately not unified.

use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use super::AdapterHandle;
use crate::apply::apply_functions;
use crate::host::{Attrs, Listener, ScopeHost};
use crate::registry::{Component, ComponentRef, ComponentSource, ResolveError, resolve};
use crate::render::{VRenderer, render_component};
use crate::types::{PropMap, PropSpec, Value, WatchDepth};
use crate::watch::{WatchSpec, watch_props};

// =============================================================================
// Configuration
// =============================================================================

/// Static configuration merged onto a generated directive's own settings.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectiveConfig {
    /// Default watch depth when the element carries no `watch-depth`
    /// attribute.
    pub watch_depth: Option<WatchDepth>,
}

// =============================================================================
// Factory
// =============================================================================

/// Produces [`Directive`]s sharing one renderer and one source list.
pub struct DirectiveFactory<R: VRenderer> {
    renderer: Rc<R>,
    sources: Vec<Rc<dyn ComponentSource<R::Tree>>>,
}

impl<R> DirectiveFactory<R>
where
    R: VRenderer + 'static,
    R::Tree: 'static,
    R::Target: 'static,
{
    pub fn new(renderer: Rc<R>, sources: Vec<Rc<dyn ComponentSource<R::Tree>>>) -> Self {
        Self { renderer, sources }
    }

    /// Build an adapter for one component.
    ///
    /// `props` may be empty: the directive then falls back to the resolved
    /// component's declared prop names, and as a last resort to every
    /// attribute present on the host element. `injected` is merged into
    /// every render after scope-derived props, so injected values win on
    /// key collision.
    pub fn directive(
        &self,
        component: impl Into<ComponentRef<R::Tree>>,
        props: Vec<PropSpec>,
        config: DirectiveConfig,
        injected: PropMap,
    ) -> Directive<R> {
        Directive {
            renderer: Rc::clone(&self.renderer),
            sources: self.sources.clone(),
            component: component.into(),
            props,
            config,
            injected,
        }
    }
}

// =============================================================================
// Directive
// =============================================================================

/// A reusable adapter bound to one component, linked once per element.
pub struct Directive<R: VRenderer> {
    renderer: Rc<R>,
    sources: Vec<Rc<dyn ComponentSource<R::Tree>>>,
    component: ComponentRef<R::Tree>,
    props: Vec<PropSpec>,
    config: DirectiveConfig,
    injected: PropMap,
}

impl<R> Directive<R>
where
    R: VRenderer + 'static,
    R::Tree: 'static,
    R::Target: 'static,
{
    /// Attach to a host element.
    ///
    /// Resolves the component once, registers one watch expression per
    /// declared prop (host attribute found case-insensitively), then
    /// renders the initial frame.
    pub fn link(
        &self,
        scope: &Rc<dyn ScopeHost>,
        target: &Rc<R::Target>,
        attrs: &Attrs,
    ) -> Result<AdapterHandle, ResolveError> {
        let component = resolve(&self.component, &self.sources)?;
        let specs = self.effective_props(&component, attrs);
        debug!(props = specs.len(), "linking directive");

        let default_depth = attrs
            .get(super::ATTR_WATCH_DEPTH)
            .map(WatchDepth::parse)
            .or(self.config.watch_depth)
            .unwrap_or_default();

        // Props without a matching attribute still render (as null), they
        // just have nothing to watch.
        let watch_specs: Vec<WatchSpec> = specs
            .iter()
            .filter_map(|spec| {
                attrs
                    .find(spec.name())
                    .map(|expr| WatchSpec::with_config(expr, spec.config()))
            })
            .collect();

        let rerender = self.rerender_listener(&component, scope, target, specs, attrs.clone());
        let watches = watch_props(default_depth, scope, &watch_specs, Rc::clone(&rerender));

        // Initial frame, independent of the first watch firing.
        rerender();

        Ok(AdapterHandle::new(watches))
    }

    /// The declared prop list, or its fallbacks: the component's own
    /// prop names, else every attribute on the element.
    fn effective_props(&self, component: &Component<R::Tree>, attrs: &Attrs) -> Vec<PropSpec> {
        if !self.props.is_empty() {
            return self.props.clone();
        }
        if let Some(names) = component.prop_names() {
            return names.iter().map(PropSpec::bare).collect();
        }
        attrs.names().into_iter().map(PropSpec::bare).collect()
    }

    /// The shared rebuild-and-render listener: evaluate each prop's bound
    /// attribute, wrap callbacks, merge injected props on top, schedule a
    /// full remount.
    fn rerender_listener(
        &self,
        component: &Component<R::Tree>,
        scope: &Rc<dyn ScopeHost>,
        target: &Rc<R::Target>,
        specs: Vec<PropSpec>,
        attrs: Attrs,
    ) -> Listener {
        let renderer = Rc::clone(&self.renderer);
        let component = component.clone();
        let scope = Rc::clone(scope);
        let target = Rc::clone(target);
        let injected = self.injected.clone();

        Rc::new(move || {
            let mut scope_props = PropMap::new();
            let mut config = IndexMap::new();
            for spec in &specs {
                let value = attrs
                    .find(spec.name())
                    .map(|expr| scope.eval(expr))
                    .unwrap_or(Value::Null);
                scope_props.insert(spec.name().to_string(), value);
                config.insert(spec.name().to_string(), spec.config());
            }

            let mut props = apply_functions(&scope_props, &scope, &config);
            // Injected props merge last and win on collision. They bypass
            // callback wrapping: the caller owns their cycle behavior.
            for (name, value) in &injected {
                props.insert(name.clone(), value.clone());
            }

            render_component(&renderer, &component, props, &scope, &target);
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
