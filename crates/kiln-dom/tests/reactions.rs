//! Custom element reaction tests for kiln-dom
//!
//! Exercises upgrades, connection reactions across shadow trees and
//! fragment moves, and re-entrant DOM access from reactions.

use std::cell::RefCell;
use std::rc::Rc;

use kiln_dom::{
    CustomElementDefinition, CustomElementReactions, Document, NodeRef, ShadowRootMode,
    WeakNodeRef,
};

type Log = Rc<RefCell<Vec<String>>>;

struct Recorder {
    label: String,
    log: Log,
}

impl CustomElementReactions for Recorder {
    fn connected(&self) {
        self.log.borrow_mut().push(format!("{}:connected", self.label));
    }

    fn disconnected(&self) {
        self.log.borrow_mut().push(format!("{}:disconnected", self.label));
    }

    fn attribute_changed(&self, name: &str, _old: Option<&str>, new: Option<&str>) {
        self.log.borrow_mut().push(format!("{}:{}={:?}", self.label, name, new));
    }
}

fn define_recorder(doc: &Document, tag: &str, log: &Log) {
    let log = Rc::clone(log);
    let label = tag.to_string();
    doc.define(CustomElementDefinition::new(
        tag,
        vec!["state".to_string()],
        Rc::new(move |_: &NodeRef| {
            Rc::new(Recorder {
                label: label.clone(),
                log: Rc::clone(&log),
            }) as Rc<dyn CustomElementReactions>
        }),
    ))
    .unwrap();
}

// ============================================================================
// CONNECTION ORDER
// ============================================================================

#[test]
fn test_connected_in_tree_order() {
    let doc = Document::new();
    let log: Log = Rc::default();
    define_recorder(&doc, "x-outer", &log);
    define_recorder(&doc, "x-inner", &log);

    let outer = doc.create_element("x-outer");
    let inner = doc.create_element("x-inner");
    outer.append_child(&inner).unwrap();
    assert!(log.borrow().is_empty());

    doc.body().append_child(&outer).unwrap();
    assert_eq!(*log.borrow(), vec!["x-outer:connected", "x-inner:connected"]);
}

#[test]
fn test_shadow_children_are_connected_with_host() {
    let doc = Document::new();
    let log: Log = Rc::default();
    define_recorder(&doc, "x-inner", &log);

    let host = doc.create_element("div");
    let shadow = host.attach_shadow(ShadowRootMode::Open).unwrap();
    let inner = doc.create_element("x-inner");
    shadow.append_child(&inner).unwrap();

    doc.body().append_child(&host).unwrap();
    assert!(inner.is_connected());
    assert_eq!(*log.borrow(), vec!["x-inner:connected"]);

    host.remove();
    assert_eq!(*log.borrow(), vec!["x-inner:connected", "x-inner:disconnected"]);
}

#[test]
fn test_move_reports_disconnect_then_connect() {
    let doc = Document::new();
    let log: Log = Rc::default();
    define_recorder(&doc, "x-item", &log);

    let first = doc.create_element("section");
    let second = doc.create_element("section");
    doc.body().append_child(&first).unwrap();
    doc.body().append_child(&second).unwrap();

    let item = doc.create_element("x-item");
    first.append_child(&item).unwrap();
    log.borrow_mut().clear();

    second.append_child(&item).unwrap();
    assert_eq!(*log.borrow(), vec!["x-item:disconnected", "x-item:connected"]);
    assert_eq!(item.parent(), Some(second));
}

#[test]
fn test_fragment_children_connect() {
    let doc = Document::new();
    let log: Log = Rc::default();
    define_recorder(&doc, "x-item", &log);

    let fragment = doc.create_document_fragment();
    fragment.append_child(&doc.create_element("x-item")).unwrap();
    fragment.append_child(&doc.create_element("x-item")).unwrap();

    doc.body().append_child(&fragment).unwrap();
    assert!(fragment.children().is_empty());
    assert_eq!(doc.body().children().len(), 2);
    assert_eq!(*log.borrow(), vec!["x-item:connected", "x-item:connected"]);
}

// ============================================================================
// UPGRADES
// ============================================================================

#[test]
fn test_plain_element_upgrades_on_connect() {
    let doc = Document::new();
    let log: Log = Rc::default();
    define_recorder(&doc, "x-late", &log);

    let el = doc.create_plain_element("x-late");
    el.set_attribute("state", "ready").unwrap();
    assert!(el.custom_element().is_none());

    doc.body().append_child(&el).unwrap();
    assert!(el.custom_element().is_some());
    assert_eq!(*log.borrow(), vec!["x-late:state=Some(\"ready\")", "x-late:connected"]);
}

#[test]
fn test_explicit_upgrade_is_one_shot() {
    let doc = Document::new();
    let log: Log = Rc::default();
    define_recorder(&doc, "x-once", &log);

    let el = doc.create_plain_element("x-once");
    assert!(doc.upgrade(el.id()));
    assert!(!doc.upgrade(el.id()));
    assert!(!doc.upgrade(doc.create_element("div").id()));
}

// ============================================================================
// RE-ENTRANCY
// ============================================================================

// The document owns its reactions, so they hold the element weakly
struct Builder {
    node: WeakNodeRef,
}

impl CustomElementReactions for Builder {
    fn connected(&self) {
        let Some(node) = self.node.upgrade() else {
            return;
        };
        let shadow = node.shadow_root()
            .unwrap_or_else(|| node.attach_shadow(ShadowRootMode::Open).unwrap());
        let label = node.document().create_element("span");
        label.set_text_content("built").unwrap();
        shadow.append_child(&label).unwrap();
        node.set_attribute("built", "").unwrap();
    }
}

#[test]
fn test_reactions_may_mutate_the_tree() {
    let doc = Document::new();
    doc.define(CustomElementDefinition::new(
        "x-builder",
        Vec::new(),
        Rc::new(|node: &NodeRef| Rc::new(Builder { node: node.downgrade() }) as Rc<dyn CustomElementReactions>),
    ))
    .unwrap();

    let el = doc.create_element("x-builder");
    doc.body().append_child(&el).unwrap();

    assert!(el.has_attribute("built"));
    let shadow = el.shadow_root().unwrap();
    assert_eq!(shadow.text_content(), "built");

    let weak = el.downgrade();
    drop((el, shadow, doc));
    assert!(weak.upgrade().is_none());
}

#[test]
fn test_reactions_object_is_shared() {
    let doc = Document::new();
    let log: Log = Rc::default();
    define_recorder(&doc, "x-self", &log);

    let el = doc.create_element("x-self");
    let recorder = el.custom_element().unwrap();
    assert!(Rc::ptr_eq(&recorder, &el.custom_element().unwrap()));
}

#[test]
fn test_weak_handle_does_not_keep_document_alive() {
    let weak = {
        let doc = Document::new();
        doc.body().downgrade()
    };
    assert!(weak.upgrade().is_none());

    let doc = Document::new();
    let weak = doc.body().downgrade();
    assert_eq!(weak.upgrade(), Some(doc.body()));
}
