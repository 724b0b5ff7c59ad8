//! Component trait
//!
//! A widget is a plain struct implementing [`Component`]. The engine in
//! [`crate::lifecycle`] owns one instance per element and calls the hooks
//! below; every hook receives the element's [`Host`].
//!
//! Hooks run in this order over an element's life:
//!
//! 1. `create` when the element is upgraded
//! 2. on first connection: `preload`, stylesheets, `template`,
//!    `build_dom`, `attach`
//! 3. once per frame with queued observed-attribute changes: `update`
//!    (per change, or once with [`AttributeUpdate::All`]), then `after_flush`
//! 4. on removal: `pre_unload`, `detach`
//!
//! The document owns each instance through its element. Components that
//! keep handles between hooks hold [`WeakHost`](crate::WeakHost) and
//! [`WeakNodeRef`](kiln_dom::WeakNodeRef); a stored [`NodeRef`] or
//! [`Host`] keeps the document alive.

use std::ops::ControlFlow;

use kiln_dom::{NodeRef, StyleSheet};
use kiln_html::Template;

use crate::config;
use crate::host::Host;

/// What changed since the last flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeUpdate<'a> {
    /// Batched flush for components that re-read all their state
    All,
    /// One observed attribute; `old` is the value before the first change
    /// of the frame, `new` the value after the last one
    Changed {
        name: &'a str,
        old: Option<&'a str>,
        new: Option<&'a str>,
    },
}

pub trait Component: Sized + 'static {
    /// Tag name suffix, e.g. `"badge"` for `<kn-badge>`
    fn local_name() -> &'static str;

    /// Build the instance for a freshly upgraded element
    fn create(host: &Host) -> Self;

    /// Full tag name: the configured prefix plus [`Component::local_name`]
    fn tag_name() -> String {
        format!("{}-{}", config::tag_prefix(), Self::local_name())
    }

    /// Attributes whose changes reach [`Component::update`]
    fn observed_attributes() -> &'static [&'static str] {
        &[]
    }

    /// Render into an open shadow root rather than the element itself
    fn is_shadow_element() -> bool {
        true
    }

    /// ARIA role written to the element internals on creation
    fn role() -> Option<&'static str> {
        None
    }

    fn template(&self) -> Option<Template> {
        None
    }

    /// Adopted stylesheets for the shadow root
    fn stylesheets(&self) -> Vec<StyleSheet> {
        Vec::new()
    }

    /// Legacy inline `<style>` text
    fn style(&self) -> Option<String> {
        None
    }

    /// Deliver one [`AttributeUpdate::All`] per flush instead of one
    /// update per changed attribute
    fn update_all_at_once(&self) -> bool {
        false
    }

    fn preload(&mut self, _host: &Host) {}

    fn build_dom(&mut self, _host: &Host, _container: &NodeRef) {}

    /// Return `ControlFlow::Break(())` to skip the rest of this flush
    fn update(&mut self, _host: &Host, _change: AttributeUpdate<'_>) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn attach(&mut self, _host: &Host) {}

    fn pre_unload(&mut self, _host: &Host) {}

    fn detach(&mut self, _host: &Host) {}

    fn after_flush(&mut self, _host: &Host) {}
}
