//! Element engine errors

use kiln_dom::DomError;

/// Errors surfaced by the element engine
#[derive(Debug, thiserror::Error)]
pub enum ElementError {
    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("No custom element defined for <{0}>")]
    NotDefined(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ElementError>;
