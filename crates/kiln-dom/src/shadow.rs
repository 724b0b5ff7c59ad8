//! Shadow DOM
//!
//! Shadow roots and constructable stylesheets adopted by them.

use std::rc::Rc;

use crate::NodeId;

/// Shadow root mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowRootMode {
    #[default]
    Open,
    Closed,
}

/// Shadow root
#[derive(Debug, Clone)]
pub struct ShadowRoot {
    /// Host element
    pub host: NodeId,
    /// Mode (open/closed)
    pub mode: ShadowRootMode,
    /// Stylesheets adopted by this root, in cascade order
    adopted_style_sheets: Vec<StyleSheet>,
}

impl ShadowRoot {
    /// Create a new shadow root
    pub fn new(host: NodeId, mode: ShadowRootMode) -> Self {
        Self {
            host,
            mode,
            adopted_style_sheets: Vec::new(),
        }
    }

    /// Adopted stylesheets
    pub fn adopted_style_sheets(&self) -> &[StyleSheet] {
        &self.adopted_style_sheets
    }

    /// Replace the adopted stylesheets
    pub fn set_adopted_style_sheets(&mut self, sheets: Vec<StyleSheet>) {
        self.adopted_style_sheets = sheets;
    }
}

/// Constructable stylesheet
///
/// Built once from CSS text and shared between every shadow root that
/// adopts it; clones are cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSheet {
    css: Rc<str>,
}

impl StyleSheet {
    pub fn new(css: &str) -> Self {
        Self { css: Rc::from(css) }
    }

    /// CSS source text
    pub fn css_text(&self) -> &str {
        &self.css
    }

    /// Whether two handles share the same underlying sheet
    pub fn ptr_eq(&self, other: &StyleSheet) -> bool {
        Rc::ptr_eq(&self.css, &other.css)
    }
}
