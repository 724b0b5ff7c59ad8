//! Inline style declarations
//!
//! Parses and re-serializes the `style` attribute.

/// Ordered `property: value` list of an element's inline style
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssStyleDeclaration {
    declarations: Vec<(String, String)>,
}

impl CssStyleDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `style` attribute value; malformed entries are skipped
    pub fn parse(text: &str) -> Self {
        let declarations = text.split(';')
            .filter_map(|decl| {
                let (name, value) = decl.split_once(':')?;
                let name = name.trim();
                let value = value.trim();
                (!name.is_empty() && !value.is_empty())
                    .then(|| (name.to_ascii_lowercase(), value.to_string()))
            })
            .collect();
        Self { declarations }
    }

    pub fn get_property_value(&self, property: &str) -> Option<&str> {
        self.declarations.iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, value)| value.as_str())
    }

    /// Set or replace a property
    pub fn set_property(&mut self, property: &str, value: &str) {
        match self.declarations.iter_mut().find(|(name, _)| name.eq_ignore_ascii_case(property)) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.declarations.push((property.to_ascii_lowercase(), value.to_string())),
        }
    }

    /// Remove a property, returning its old value
    pub fn remove_property(&mut self, property: &str) -> Option<String> {
        let pos = self.declarations.iter().position(|(name, _)| name.eq_ignore_ascii_case(property))?;
        Some(self.declarations.remove(pos).1)
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Serialized `style` attribute value
    pub fn css_text(&self) -> String {
        self.declarations.iter()
            .map(|(name, value)| format!("{name}: {value};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize() {
        let mut style = CssStyleDeclaration::parse("color: red; ; Width:10px; bogus");
        assert_eq!(style.get_property_value("color"), Some("red"));
        assert_eq!(style.get_property_value("width"), Some("10px"));

        style.set_property("color", "blue");
        style.set_property("--accent", "#fff");
        assert_eq!(style.css_text(), "color: blue; width: 10px; --accent: #fff;");

        assert_eq!(style.remove_property("width").as_deref(), Some("10px"));
        assert_eq!(style.remove_property("width"), None);
    }
}
