//! Custom state facade
//!
//! Boolean named states backing `:state(...)` selectors. Adding a present
//! state or removing an absent one is a no-op; every mutator returns
//! `&Self` so calls chain.

use kiln_dom::{CustomStateSet, NodeRef};

pub trait CustomStates {
    /// Run `f` against the element's state set
    fn with_states<R>(&self, f: impl FnOnce(&mut CustomStateSet) -> R) -> R;

    fn add_state(&self, state: &str) -> &Self {
        self.with_states(|states| states.add(state));
        self
    }

    fn add_states(&self, states: &[&str]) -> &Self {
        self.with_states(|set| {
            for state in states {
                set.add(state);
            }
        });
        self
    }

    fn remove_state(&self, state: &str) -> &Self {
        self.with_states(|states| states.delete(state));
        self
    }

    fn remove_states(&self, states: &[&str]) -> &Self {
        self.with_states(|set| {
            for state in states {
                set.delete(state);
            }
        });
        self
    }

    /// Add or remove depending on `on`
    fn toggle_state(&self, state: &str, on: bool) -> &Self {
        if on {
            self.add_state(state)
        } else {
            self.remove_state(state)
        }
    }

    fn has_state(&self, state: &str) -> bool {
        self.with_states(|states| states.has(state))
    }

    fn clear_states(&self) -> &Self {
        self.with_states(CustomStateSet::clear);
        self
    }

    /// Current states, sorted
    fn states(&self) -> Vec<String> {
        self.with_states(|states| states.iter().map(str::to_string).collect())
    }
}

impl CustomStates for NodeRef {
    fn with_states<R>(&self, f: impl FnOnce(&mut CustomStateSet) -> R) -> R {
        self.with_custom_states(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_dom::Document;

    #[test]
    fn test_idempotent_and_chainable() {
        let doc = Document::new();
        let el = doc.create_element("div");

        el.add_state("open").add_state("open").add_states(&["busy", "open"]);
        assert_eq!(el.states(), vec!["busy", "open"]);

        el.remove_state("missing").remove_state("busy");
        assert!(el.has_state("open"));
        assert!(!el.has_state("busy"));

        el.clear_states();
        assert!(el.states().is_empty());
    }

    #[test]
    fn test_toggle_state() {
        let doc = Document::new();
        let el = doc.create_element("div");
        el.toggle_state("active", true);
        assert!(el.has_state("active"));
        el.toggle_state("active", false);
        assert!(!el.has_state("active"));
    }
}
