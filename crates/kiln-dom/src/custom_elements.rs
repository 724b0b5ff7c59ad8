//! Custom Elements
//!
//! Custom element registry, lifecycle reactions, and ElementInternals.

use std::any::{Any, TypeId};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::{DomError, NodeRef};

/// Lifecycle reactions of an upgraded custom element
///
/// Invoked by the [`Document`](crate::Document) after the mutation that
/// caused them, never while the tree is borrowed, so implementations may
/// freely read and mutate the DOM.
pub trait CustomElementReactions {
    /// Element became connected to the document
    fn connected(&self) {}

    /// Element was removed from the document
    fn disconnected(&self) {}

    /// An observed attribute was set or removed
    fn attribute_changed(&self, _name: &str, _old_value: Option<&str>, _new_value: Option<&str>) {}

    /// Type-erased handle so owners can recover their concrete type
    fn into_any(self: Rc<Self>) -> Option<Rc<dyn Any>> {
        None
    }
}

/// Builds the reactions object for a freshly upgraded element
pub type ElementConstructor = Rc<dyn Fn(&NodeRef) -> Rc<dyn CustomElementReactions>>;

/// Custom element definition
pub struct CustomElementDefinition {
    /// Element name
    pub name: String,
    /// Attributes whose changes are reported to the element
    pub observed_attributes: Vec<String>,
    /// Type the constructor builds, when the owner wants name lookup by type
    pub element_type: Option<TypeId>,
    constructor: ElementConstructor,
}

impl CustomElementDefinition {
    pub fn new(name: &str, observed_attributes: Vec<String>, constructor: ElementConstructor) -> Self {
        Self {
            name: name.to_string(),
            observed_attributes,
            element_type: None,
            constructor,
        }
    }

    /// Tag the definition with the type its constructor builds
    pub fn with_type(mut self, element_type: TypeId) -> Self {
        self.element_type = Some(element_type);
        self
    }

    /// Whether changes to `attr` are reported
    pub fn observes(&self, attr: &str) -> bool {
        self.observed_attributes.iter().any(|a| a.eq_ignore_ascii_case(attr))
    }

    pub(crate) fn construct(&self, node: &NodeRef) -> Rc<dyn CustomElementReactions> {
        (self.constructor)(node)
    }
}

impl fmt::Debug for CustomElementDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomElementDefinition")
            .field("name", &self.name)
            .field("observed_attributes", &self.observed_attributes)
            .finish_non_exhaustive()
    }
}

/// Definition and reactions attached to an upgraded element
#[derive(Clone)]
pub(crate) struct CustomElementState {
    pub(crate) definition: Rc<CustomElementDefinition>,
    pub(crate) reactions: Rc<dyn CustomElementReactions>,
}

impl fmt::Debug for CustomElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomElementState")
            .field("definition", &self.definition.name)
            .finish_non_exhaustive()
    }
}

/// Custom elements registry
#[derive(Debug, Default)]
pub struct CustomElementRegistry {
    definitions: HashMap<String, Rc<CustomElementDefinition>>,
}

impl CustomElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a custom element; repeat definitions are an error
    pub fn define(&mut self, definition: CustomElementDefinition) -> Result<Rc<CustomElementDefinition>, DomError> {
        if !Self::is_valid_name(&definition.name) {
            return Err(DomError::InvalidName(definition.name));
        }
        if self.definitions.contains_key(&definition.name) {
            return Err(DomError::AlreadyDefined(definition.name));
        }
        if let Some(name) = definition.element_type.and_then(|t| self.get_name(t)) {
            return Err(DomError::TypeAlreadyDefined(name));
        }
        let definition = Rc::new(definition);
        self.definitions.insert(definition.name.clone(), Rc::clone(&definition));
        Ok(definition)
    }

    /// Get element definition
    pub fn get(&self, name: &str) -> Option<Rc<CustomElementDefinition>> {
        self.definitions.get(&name.to_ascii_lowercase()).cloned()
    }

    /// Name a type was registered under
    pub fn get_name(&self, element_type: TypeId) -> Option<String> {
        self.definitions
            .values()
            .find(|d| d.element_type == Some(element_type))
            .map(|d| d.name.clone())
    }

    /// Check if element is defined
    pub fn is_defined(&self, name: &str) -> bool {
        self.definitions.contains_key(&name.to_ascii_lowercase())
    }

    /// Defined names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Validate custom element name
    pub fn is_valid_name(name: &str) -> bool {
        // Must contain hyphen
        if !name.contains('-') {
            return false;
        }

        // Must start with lowercase letter
        if !name.chars().next().map(|c| c.is_ascii_lowercase()).unwrap_or(false) {
            return false;
        }

        // Reserved names
        const RESERVED: &[&str] = &[
            "annotation-xml", "color-profile", "font-face",
            "font-face-src", "font-face-uri", "font-face-format",
            "font-face-name", "missing-glyph",
        ];
        if RESERVED.contains(&name) {
            return false;
        }

        name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' || c == '.')
    }
}

/// ElementInternals - accessibility role, ARIA and custom states
#[derive(Debug, Default, Clone)]
pub struct ElementInternals {
    /// ARIA role
    role: Option<String>,
    /// ARIA attributes
    aria: AriaMap,
    /// Custom states for `:state(...)` selectors
    states: CustomStateSet,
}

impl ElementInternals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn set_role(&mut self, role: Option<&str>) {
        self.role = role.map(str::to_string);
    }

    /// Set ARIA attribute
    pub fn set_aria(&mut self, name: &str, value: &str) {
        self.aria.set(name, value);
    }

    /// Get ARIA attribute
    pub fn get_aria(&self, name: &str) -> Option<&str> {
        self.aria.get(name)
    }

    pub fn states(&self) -> &CustomStateSet {
        &self.states
    }

    pub fn states_mut(&mut self) -> &mut CustomStateSet {
        &mut self.states
    }
}

/// ARIA attribute map
#[derive(Debug, Default, Clone)]
pub struct AriaMap {
    attrs: HashMap<String, String>,
}

impl AriaMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.attrs.insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.attrs.remove(name)
    }
}

/// CustomStateSet - duplicate-free state tokens
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CustomStateSet {
    states: BTreeSet<String>,
}

impl CustomStateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a state; false if already present
    pub fn add(&mut self, state: &str) -> bool {
        self.states.insert(state.to_string())
    }

    /// Delete a state; false if absent
    pub fn delete(&mut self, state: &str) -> bool {
        self.states.remove(state)
    }

    pub fn has(&self, state: &str) -> bool {
        self.states.contains(state)
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(String::as_str)
    }
}
