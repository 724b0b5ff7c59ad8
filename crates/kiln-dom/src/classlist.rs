//! DOMTokenList (classList)
//!
//! Ordered, duplicate-free token set backing the `class` attribute.
//! Mutators report whether anything changed so callers can skip
//! rewriting the attribute (and waking attribute observers) on no-ops.

/// DOMTokenList for space-separated tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DOMTokenList {
    tokens: Vec<String>,
}

impl DOMTokenList {
    /// Create empty token list
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a space-separated attribute value, dropping duplicates
    pub fn parse(value: &str) -> Self {
        let mut list = Self::new();
        for token in value.split_whitespace() {
            list.insert(token);
        }
        list
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Check if token exists
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    fn insert(&mut self, token: &str) -> bool {
        if token.is_empty() || token.contains(char::is_whitespace) || self.contains(token) {
            return false;
        }
        self.tokens.push(token.to_string());
        true
    }

    /// Add tokens; true if at least one was new
    pub fn add<S: AsRef<str>>(&mut self, tokens: &[S]) -> bool {
        tokens.iter().fold(false, |changed, t| self.insert(t.as_ref()) | changed)
    }

    /// Remove tokens; true if at least one was present
    pub fn remove<S: AsRef<str>>(&mut self, tokens: &[S]) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|t| !tokens.iter().any(|r| r.as_ref() == t));
        self.tokens.len() != before
    }

    /// Toggle token, returns whether it is present afterwards
    pub fn toggle(&mut self, token: &str, force: Option<bool>) -> bool {
        let present = force.unwrap_or(!self.contains(token));
        if present {
            self.insert(token);
        } else {
            self.remove(&[token]);
        }
        present
    }

    /// Serialized attribute value
    pub fn value(&self) -> String {
        self.tokens.join(" ")
    }

    /// Iterate over tokens
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|s| s.as_str())
    }
}

impl std::fmt::Display for DOMTokenList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dedupes() {
        let list = DOMTokenList::parse("btn  btn-primary btn");
        assert_eq!(list.len(), 2);
        assert_eq!(list.value(), "btn btn-primary");
    }

    #[test]
    fn test_add_remove_report_changes() {
        let mut list = DOMTokenList::new();
        assert!(list.add(&["foo", "bar"]));
        assert!(!list.add(&["foo"]));
        assert!(!list.add(&[""]));

        assert!(list.remove(&["foo"]));
        assert!(!list.remove(&["foo"]));
        assert_eq!(list.value(), "bar");
    }

    #[test]
    fn test_toggle() {
        let mut list = DOMTokenList::new();

        assert!(list.toggle("active", None));
        assert!(list.contains("active"));
        assert!(!list.toggle("active", None));
        assert!(!list.contains("active"));

        assert!(list.toggle("open", Some(true)));
        assert!(list.toggle("open", Some(true)));
        assert_eq!(list.len(), 1);
        assert!(!list.toggle("open", Some(false)));
        assert!(list.is_empty());
    }
}
