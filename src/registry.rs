//! Component resolution - name/reference to component function.
//!
//! Lookup goes through an ordered list of [`ComponentSource`]s supplied at
//! setup time. A source miss is silent (fall through to the next source);
//! only exhausting every source is an error. Two sources ship with the
//! crate:
//! - [`MapSource`] - flat name -> component table (dependency-injection
//!   style lookup)
//! - [`NamespaceSource`] - dotted-path walk through nested namespaces
//!   (the explicit replacement for a process-global component object)

use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::types::PropMap;

// =============================================================================
// Errors
// =============================================================================

/// Attach-time resolution failures. Both are fatal for the adapter
/// instance being linked; neither affects sibling adapters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// No component name or reference was supplied.
    #[error("component name attribute must be specified")]
    MissingName,
    /// The name matched nothing in any configured source.
    #[error("cannot find component `{0}`")]
    NotFound(String),
}

// =============================================================================
// Component
// =============================================================================

/// An embedded component: a pure function from props to a virtual-DOM tree,
/// plus an optional declared prop-name list used for prop auto-discovery.
pub struct Component<T> {
    render: Rc<dyn Fn(&PropMap) -> T>,
    prop_names: Option<Rc<[String]>>,
}

impl<T> Component<T> {
    pub fn new(render: impl Fn(&PropMap) -> T + 'static) -> Self {
        Self {
            render: Rc::new(render),
            prop_names: None,
        }
    }

    /// Declare the component's prop names (its prop-types surface).
    pub fn with_prop_names(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.prop_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Render a virtual-DOM tree from props.
    pub fn render(&self, props: &PropMap) -> T {
        (self.render)(props)
    }

    /// Declared prop names, if the component declares any.
    pub fn prop_names(&self) -> Option<&[String]> {
        self.prop_names.as_deref()
    }
}

// Manual impls: derives would demand T: Clone / T: Debug.
impl<T> Clone for Component<T> {
    fn clone(&self) -> Self {
        Self {
            render: Rc::clone(&self.render),
            prop_names: self.prop_names.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Component<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("prop_names", &self.prop_names)
            .finish_non_exhaustive()
    }
}

/// A component given to an adapter: either the component itself, or a key
/// resolved through the configured sources at link time.
#[derive(Clone)]
pub enum ComponentRef<T> {
    Direct(Component<T>),
    Name(String),
}

impl<T> From<Component<T>> for ComponentRef<T> {
    fn from(component: Component<T>) -> Self {
        ComponentRef::Direct(component)
    }
}

impl<T> From<&str> for ComponentRef<T> {
    fn from(name: &str) -> Self {
        ComponentRef::Name(name.to_string())
    }
}

impl<T> From<String> for ComponentRef<T> {
    fn from(name: String) -> Self {
        ComponentRef::Name(name)
    }
}

// =============================================================================
// Sources
// =============================================================================

/// A place components can be looked up by name.
///
/// `lookup` returning `None` means "not found here, try the next source" -
/// sources must swallow their own lookup failures rather than surface them.
pub trait ComponentSource<T> {
    fn lookup(&self, name: &str) -> Option<Component<T>>;
}

/// Flat name -> component table.
#[derive(Default)]
pub struct MapSource<T> {
    components: HashMap<String, Component<T>>,
}

impl<T> MapSource<T> {
    pub fn new() -> Self {
        Self {
            components: HashMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, component: Component<T>) -> Self {
        self.components.insert(name.into(), component);
        self
    }

    pub fn register(&mut self, name: impl Into<String>, component: Component<T>) {
        self.components.insert(name.into(), component);
    }
}

impl<T> ComponentSource<T> for MapSource<T> {
    fn lookup(&self, name: &str) -> Option<Component<T>> {
        self.components.get(name).cloned()
    }
}

enum Node<T> {
    Leaf(Component<T>),
    Branch(HashMap<String, Node<T>>),
}

/// Nested namespaces resolved by walking a dot-separated path
/// (`"ui.widgets.Hello"`).
#[derive(Default)]
pub struct NamespaceSource<T> {
    root: HashMap<String, Node<T>>,
}

impl<T> NamespaceSource<T> {
    pub fn new() -> Self {
        Self {
            root: HashMap::new(),
        }
    }

    pub fn with(mut self, path: &str, component: Component<T>) -> Self {
        self.register(path, component);
        self
    }

    /// Register a component under a dotted path, creating intermediate
    /// namespaces as needed. Registering over an existing entry replaces it.
    pub fn register(&mut self, path: &str, component: Component<T>) {
        let mut parts = path.split('.').peekable();
        let mut current = &mut self.root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                current.insert(part.to_string(), Node::Leaf(component));
                return;
            }
            let entry = current
                .entry(part.to_string())
                .or_insert_with(|| Node::Branch(HashMap::new()));
            current = match entry {
                Node::Branch(children) => children,
                Node::Leaf(_) => {
                    *entry = Node::Branch(HashMap::new());
                    match entry {
                        Node::Branch(children) => children,
                        Node::Leaf(_) => unreachable!(),
                    }
                }
            };
        }
    }
}

impl<T> ComponentSource<T> for NamespaceSource<T> {
    fn lookup(&self, name: &str) -> Option<Component<T>> {
        let mut parts = name.split('.');
        let mut node = self.root.get(parts.next()?)?;
        for part in parts {
            node = match node {
                Node::Branch(children) => children.get(part)?,
                Node::Leaf(_) => return None,
            };
        }
        match node {
            Node::Leaf(component) => Some(component.clone()),
            Node::Branch(_) => None,
        }
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolve a component reference against the configured sources.
///
/// A direct reference short-circuits without any lookup. A named reference
/// tries each source in order; every source miss is treated as "try the
/// next one". Resolution happens once per linked adapter instance.
pub fn resolve<T>(
    reference: &ComponentRef<T>,
    sources: &[Rc<dyn ComponentSource<T>>],
) -> Result<Component<T>, ResolveError> {
    let name = match reference {
        ComponentRef::Direct(component) => return Ok(component.clone()),
        ComponentRef::Name(name) => name,
    };
    if name.is_empty() {
        return Err(ResolveError::MissingName);
    }

    for (position, source) in sources.iter().enumerate() {
        if let Some(component) = source.lookup(name) {
            debug!(name, source = position, "resolved component");
            return Ok(component);
        }
    }
    Err(ResolveError::NotFound(name.clone()))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn hello() -> Component<String> {
        Component::new(|_| "hello".to_string())
    }

    fn sources(
        list: Vec<Rc<dyn ComponentSource<String>>>,
    ) -> Vec<Rc<dyn ComponentSource<String>>> {
        list
    }

    #[test]
    fn direct_reference_short_circuits() {
        // No sources at all: a direct reference must still resolve.
        let reference = ComponentRef::Direct(hello());
        let component = resolve(&reference, &[]).unwrap();
        assert_eq!(component.render(&Default::default()), "hello");
    }

    #[test]
    fn empty_name_is_missing() {
        let reference: ComponentRef<String> = ComponentRef::Name(String::new());
        assert_eq!(
            resolve(&reference, &[]).unwrap_err(),
            ResolveError::MissingName
        );
    }

    #[test]
    fn map_source_then_namespace_fallthrough() {
        let map = MapSource::new().with("Hello", hello());
        let ns = NamespaceSource::new().with("ui.widgets.Bye", {
            Component::new(|_| "bye".to_string())
        });
        let sources = sources(vec![Rc::new(map), Rc::new(ns)]);

        assert_eq!(
            resolve(&ComponentRef::from("Hello"), &sources)
                .unwrap()
                .render(&Default::default()),
            "hello"
        );
        // Miss in the map source falls through to the namespace walk.
        assert_eq!(
            resolve(&ComponentRef::from("ui.widgets.Bye"), &sources)
                .unwrap()
                .render(&Default::default()),
            "bye"
        );
        assert_eq!(
            resolve(&ComponentRef::from("ui.widgets.Nope"), &sources).unwrap_err(),
            ResolveError::NotFound("ui.widgets.Nope".to_string())
        );
    }

    #[test]
    fn namespace_partial_path_is_not_a_component() {
        let ns = NamespaceSource::new().with("ui.widgets.Hello", hello());
        assert!(ns.lookup("ui.widgets").is_none());
        assert!(ns.lookup("ui.widgets.Hello.extra").is_none());
        assert!(ns.lookup("ui.widgets.Hello").is_some());
    }

    #[test]
    fn component_renders_from_props() {
        let component = Component::new(|props: &PropMap| {
            match props.get("name") {
                Some(Value::Str(name)) => format!("Hello {name}"),
                _ => "Hello".to_string(),
            }
        });
        let mut props = PropMap::new();
        props.insert("name".to_string(), Value::str("World"));
        assert_eq!(component.render(&props), "Hello World");
    }
}
