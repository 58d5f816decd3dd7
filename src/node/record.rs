use super::Node;
use indexmap::IndexMap;

/// A flat set of named input fields, as handed to [`crate::Group::fill_from_mapping`].
///
/// A field can be present with a value, present but null, or missing.
/// Only fields present with a value are considered set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, Option<Node>>,
}
impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field with a value.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Node>) -> Self {
        self.insert(field, value);
        self
    }

    /// Add a field that is present, but null.
    #[must_use]
    pub fn with_null(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into(), None);
        self
    }

    /// Set a field's value, replacing any previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Node>) {
        self.fields.insert(field.into(), Some(value.into()));
    }

    /// Returns the value of a field, if it is present and not null.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Node> {
        self.fields.get(field).and_then(Option::as_ref)
    }

    /// Returns true if the field is present and not null.
    #[must_use]
    pub fn is_set(&self, field: &str) -> bool {
        self.get(field).is_some()
    }
}
impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Node>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = Self::new();
        for (field, value) in iter {
            record.insert(field, value);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_is_not_set() {
        let record = Record::new().with("piva", "0123").with_null("codfisc");
        assert!(record.is_set("piva"));
        assert!(!record.is_set("codfisc"));
        assert!(!record.is_set("ragsoc"));
        assert_eq!(record.get("piva"), Some(&Node::from("0123")));
    }

    #[test]
    fn test_from_iter() {
        let record: Record = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(record.get("b").and_then(Node::as_text), Some("2"));
    }
}
