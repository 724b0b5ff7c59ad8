//! Component lifecycle engine
//!
//! [`CustomElement`] drives one [`Component`] per element:
//!
//! ```text
//! constructed --first connect--> rendering --> rendered
//! rendered --observed attribute--> update scheduled --next frame--> rendered
//! rendered | update scheduled --removed--> torn down
//! ```
//!
//! Rendering happens once. Observed attribute changes after that are
//! queued per name (first old value, last new value) and flushed together
//! on the next animation frame.

use std::any::{Any, TypeId};
use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use kiln_dom::{
    CustomElementDefinition, CustomElementReactions, Document, NodeRef, ShadowRootMode,
    WeakNodeRef,
};

use crate::component::{AttributeUpdate, Component};
use crate::data_store::DataStore;
use crate::error::{ElementError, Result};
use crate::host::Host;
use crate::scheduler::AttributeScheduler;

/// One queued attribute change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAttribute {
    pub name: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

#[derive(Debug, Default)]
struct EngineState {
    first_load: bool,
    rendering: bool,
    pending: Vec<PendingAttribute>,
}

impl EngineState {
    /// Keep the first old value and the last new value per name
    fn record(&mut self, name: &str, old: Option<&str>, new: Option<&str>) {
        match self.pending.iter_mut().find(|p| p.name == name) {
            Some(entry) => entry.new = new.map(str::to_string),
            None => self.pending.push(PendingAttribute {
                name: name.to_string(),
                old: old.map(str::to_string),
                new: new.map(str::to_string),
            }),
        }
    }
}

struct Instance<C: Component> {
    this: Weak<Instance<C>>,
    element: WeakNodeRef,
    component: RefCell<C>,
    state: RefCell<EngineState>,
    scheduler: OnceCell<AttributeScheduler>,
    data: Rc<RefCell<DataStore>>,
}

impl<C: Component> Instance<C> {
    fn construct(node: &NodeRef) -> Rc<Self> {
        if C::is_shadow_element() && node.shadow_root().is_none() {
            if let Err(err) = node.attach_shadow(ShadowRootMode::Open) {
                tracing::warn!("<{}> could not attach a shadow root: {}", C::local_name(), err);
            }
        }
        for child in node.children() {
            if child.tag_name().as_deref() == Some("script") {
                child.remove();
            }
        }
        if let Some(role) = C::role() {
            node.with_internals(|internals| internals.set_role(Some(role)));
        }

        let data: Rc<RefCell<DataStore>> = Rc::default();
        let component = C::create(&Host::new(node.clone(), Rc::clone(&data)));
        tracing::trace!("Constructed <{}>", C::local_name());

        Rc::new_cyclic(|this| Instance {
            this: this.clone(),
            element: node.downgrade(),
            component: RefCell::new(component),
            state: RefCell::new(EngineState::default()),
            scheduler: OnceCell::new(),
            data,
        })
    }

    fn host(&self) -> Option<Host> {
        let node = self.element.upgrade()?;
        Some(Host::new(node, Rc::clone(&self.data)))
    }

    fn scheduler(&self) -> &AttributeScheduler {
        self.scheduler.get_or_init(|| {
            let this = self.this.clone();
            AttributeScheduler::new(move || {
                if let Some(instance) = this.upgrade() {
                    instance.flush();
                }
            })
        })
    }

    fn render(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.first_load || state.rendering {
                return;
            }
            state.rendering = true;
        }
        let Some(host) = self.host() else {
            self.state.borrow_mut().rendering = false;
            return;
        };
        let Ok(mut component) = self.component.try_borrow_mut() else {
            tracing::warn!("<{}> is busy, render skipped", C::local_name());
            self.state.borrow_mut().rendering = false;
            return;
        };

        component.preload(&host);

        let container = host.container();
        if C::is_shadow_element() && container.is_shadow_root() {
            apply_styles(&*component, &host, &container);
        }
        if let Some(template) = component.template() {
            let content = template.instantiate(host.document());
            if let Err(err) = container.append_child(&content) {
                tracing::warn!("<{}> template insertion failed: {}", C::local_name(), err);
            }
        }
        component.build_dom(&host, &container);
        component.attach(&host);
        drop(component);

        let mut state = self.state.borrow_mut();
        state.rendering = false;
        state.first_load = true;
        // Changes seen before the first render were already read by preload
        state.pending.clear();
        tracing::debug!("Rendered <{}>", C::local_name());
    }

    fn flush(&self) {
        let Some(host) = self.host() else {
            return;
        };
        let Ok(mut component) = self.component.try_borrow_mut() else {
            tracing::warn!("<{}> is busy, deferring flush", C::local_name());
            self.scheduler().schedule();
            return;
        };
        let queue = std::mem::take(&mut self.state.borrow_mut().pending);
        tracing::trace!("<{}> flushing {} attribute changes", C::local_name(), queue.len());

        if component.update_all_at_once() {
            let _ = component.update(&host, AttributeUpdate::All);
        } else {
            for change in &queue {
                let update = AttributeUpdate::Changed {
                    name: &change.name,
                    old: change.old.as_deref(),
                    new: change.new.as_deref(),
                };
                if component.update(&host, update).is_break() {
                    tracing::trace!("<{}> update stopped at {}", C::local_name(), change.name);
                    break;
                }
            }
        }
        component.after_flush(&host);
    }
}

fn apply_styles<C: Component>(component: &C, host: &Host, shadow: &NodeRef) {
    if let Some(css) = component.style() {
        let style = host.document().create_element("style");
        let inserted = style
            .set_text_content(&css)
            .and_then(|()| shadow.append_child(&style));
        if let Err(err) = inserted {
            tracing::warn!("<{}> inline style failed: {}", C::local_name(), err);
        }
    }
    let sheets = component.stylesheets();
    if !sheets.is_empty() {
        if let Err(err) = shadow.set_adopted_style_sheets(sheets) {
            tracing::warn!("<{}> stylesheet adoption failed: {}", C::local_name(), err);
        }
    }
}

impl<C: Component> CustomElementReactions for Instance<C> {
    fn connected(&self) {
        if self.state.borrow().first_load {
            tracing::debug!("<{}> reconnected", C::local_name());
            return;
        }
        self.render();
    }

    fn disconnected(&self) {
        let Some(host) = self.host() else {
            return;
        };
        let Ok(mut component) = self.component.try_borrow_mut() else {
            tracing::warn!("<{}> is busy, teardown skipped", C::local_name());
            return;
        };
        component.pre_unload(&host);
        component.detach(&host);
        tracing::debug!("Detached <{}>", C::local_name());
    }

    fn attribute_changed(&self, name: &str, old: Option<&str>, new: Option<&str>) {
        let loaded = {
            let mut state = self.state.borrow_mut();
            state.record(name, old, new);
            state.first_load
        };
        if loaded {
            tracing::trace!("<{}> queued {}", C::local_name(), name);
            self.scheduler().schedule();
        }
    }

    fn into_any(self: Rc<Self>) -> Option<Rc<dyn Any>> {
        Some(self)
    }
}

/// Typed handle to the engine instance behind an element
pub struct CustomElement<C: Component> {
    instance: Rc<Instance<C>>,
    _component: PhantomData<C>,
}

impl<C: Component> Clone for CustomElement<C> {
    fn clone(&self) -> Self {
        Self { instance: Rc::clone(&self.instance), _component: PhantomData }
    }
}

impl<C: Component> fmt::Debug for CustomElement<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.instance.state.borrow();
        f.debug_struct("CustomElement")
            .field("component", &C::local_name())
            .field("first_load", &state.first_load)
            .field("pending", &state.pending.len())
            .finish()
    }
}

impl<C: Component> CustomElement<C> {
    /// Registry definition for `C`, named with the current tag prefix
    pub fn definition() -> CustomElementDefinition {
        CustomElementDefinition::new(
            &C::tag_name(),
            C::observed_attributes().iter().map(|a| a.to_string()).collect(),
            Rc::new(|node: &NodeRef| Instance::<C>::construct(node) as Rc<dyn CustomElementReactions>),
        )
        .with_type(TypeId::of::<Instance<C>>())
    }

    /// Register `C`; registering the same tag or the same component twice
    /// is an error
    pub fn define(doc: &Document) -> Result<()> {
        doc.define(Self::definition())?;
        Ok(())
    }

    /// Register `C` unless it is already defined
    pub fn define_once(doc: &Document) -> bool {
        if Self::tag(doc).is_some() {
            return false;
        }
        doc.define_once(Self::definition())
    }

    /// Tag `C` was defined under in `doc`
    pub fn tag(doc: &Document) -> Option<String> {
        doc.custom_element_name(TypeId::of::<Instance<C>>())
    }

    /// Create a detached element of the tag `C` was defined under
    pub fn create(doc: &Document) -> Result<Self> {
        let tag = Self::tag(doc).ok_or_else(|| ElementError::NotDefined(C::tag_name()))?;
        let node = create_element(doc, &tag)?;
        Self::from_node(&node).ok_or(ElementError::NotDefined(tag))
    }

    /// The engine instance of an upgraded element, if it runs `C`
    pub fn from_node(node: &NodeRef) -> Option<Self> {
        let instance = node.custom_element()?.into_any()?.downcast::<Instance<C>>().ok()?;
        Some(Self { instance, _component: PhantomData })
    }

    /// The element, while its document is alive
    pub fn node(&self) -> Option<NodeRef> {
        self.instance.element.upgrade()
    }

    pub fn host(&self) -> Option<Host> {
        self.instance.host()
    }

    /// Whether the first render has completed
    pub fn is_loaded(&self) -> bool {
        self.instance.state.borrow().first_load
    }

    /// Changes waiting for the next flush
    pub fn pending_attributes(&self) -> Vec<PendingAttribute> {
        self.instance.state.borrow().pending.clone()
    }

    /// Whether a flush is waiting for the next frame
    pub fn is_update_scheduled(&self) -> bool {
        self.instance.scheduler.get().is_some_and(AttributeScheduler::is_pending)
    }

    /// Render now if it has not happened yet
    pub fn render(&self) {
        self.instance.render();
    }

    /// Read the component; None while a hook holds it
    pub fn with<R>(&self, f: impl FnOnce(&C) -> R) -> Option<R> {
        self.instance.component.try_borrow().ok().map(|c| f(&c))
    }

    /// Mutate the component; None while a hook holds it
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut C) -> R) -> Option<R> {
        self.instance.component.try_borrow_mut().ok().map(|mut c| f(&mut c))
    }
}

/// Create an element whose tag must already be defined
pub fn create_element(doc: &Document, tag: &str) -> Result<NodeRef> {
    if !doc.is_defined(tag) {
        return Err(ElementError::NotDefined(tag.to_string()));
    }
    Ok(doc.create_element(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::ControlFlow;

    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
    }

    impl Component for Recorder {
        fn local_name() -> &'static str {
            "recorder"
        }

        fn tag_name() -> String {
            "unit-recorder".to_string()
        }

        fn observed_attributes() -> &'static [&'static str] {
            &["label", "size"]
        }

        fn create(_host: &Host) -> Self {
            Self::default()
        }

        fn preload(&mut self, host: &Host) {
            self.log.push(format!("preload:{}", host.attr("label").unwrap_or_default()));
        }

        fn build_dom(&mut self, _host: &Host, _container: &NodeRef) {
            self.log.push("build".into());
        }

        fn update(&mut self, _host: &Host, change: AttributeUpdate<'_>) -> ControlFlow<()> {
            if let AttributeUpdate::Changed { name, new, .. } = change {
                self.log.push(format!("{name}={}", new.unwrap_or("-")));
            }
            ControlFlow::Continue(())
        }

        fn after_flush(&mut self, _host: &Host) {
            self.log.push("flushed".into());
        }
    }

    #[test]
    fn test_record_keeps_first_old_last_new() {
        let mut state = EngineState::default();
        state.record("a", None, Some("1"));
        state.record("b", Some("x"), Some("y"));
        state.record("a", Some("1"), Some("2"));
        assert_eq!(state.pending, vec![
            PendingAttribute { name: "a".into(), old: None, new: Some("2".into()) },
            PendingAttribute { name: "b".into(), old: Some("x".into()), new: Some("y".into()) },
        ]);
    }

    #[test]
    fn test_render_then_batched_update() {
        let doc = Document::new();
        CustomElement::<Recorder>::define(&doc).unwrap();

        let recorder = CustomElement::<Recorder>::create(&doc).unwrap();
        let node = recorder.node().unwrap();
        node.set_attribute("label", "first").unwrap();
        doc.body().append_child(&node).unwrap();

        assert!(recorder.is_loaded());
        assert!(recorder.pending_attributes().is_empty());

        node.set_attribute("label", "second").unwrap();
        node.set_attribute("label", "third").unwrap();
        node.set_attribute("size", "l").unwrap();
        assert!(recorder.is_update_scheduled());
        crate::frame::run_frame();

        let log = recorder.with(|p| p.log.clone()).unwrap();
        assert_eq!(log, vec!["preload:first", "build", "label=third", "size=l", "flushed"]);
    }

    #[test]
    fn test_undefined_tag_is_an_error() {
        let doc = Document::new();
        assert!(matches!(
            CustomElement::<Recorder>::create(&doc),
            Err(ElementError::NotDefined(tag)) if tag == "unit-recorder"
        ));
        assert!(CustomElement::<Recorder>::define_once(&doc));
        assert!(!CustomElement::<Recorder>::define_once(&doc));
        assert!(matches!(CustomElement::<Recorder>::define(&doc), Err(ElementError::Dom(_))));
    }

    #[test]
    fn test_from_node_checks_type() {
        struct Other;
        impl Component for Other {
            fn local_name() -> &'static str {
                "other"
            }
            fn tag_name() -> String {
                "unit-other".to_string()
            }
            fn create(_host: &Host) -> Self {
                Other
            }
        }

        let doc = Document::new();
        CustomElement::<Recorder>::define(&doc).unwrap();
        CustomElement::<Other>::define(&doc).unwrap();
        let node = doc.create_element("unit-other");
        assert!(CustomElement::<Other>::from_node(&node).is_some());
        assert!(CustomElement::<Recorder>::from_node(&node).is_none());
        assert!(CustomElement::<Recorder>::from_node(&doc.body()).is_none());
    }
}
