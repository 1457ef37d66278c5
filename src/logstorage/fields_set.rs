//! Needed-field sets for decode pushdown

use std::collections::HashSet;
use std::fmt;

/// Set of field names a filter tree needs decoded
///
/// Membership-only: insertion order is irrelevant. [`FieldsSet::sorted`]
/// gives a deterministic view for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldsSet {
    fields: HashSet<String>,
}

impl FieldsSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field name
    pub fn add(&mut self, field: &str) {
        if !self.fields.contains(field) {
            self.fields.insert(field.to_string());
        }
    }

    /// Add every field from `other`
    pub fn add_all(&mut self, other: &FieldsSet) {
        for field in &other.fields {
            self.add(field);
        }
    }

    /// Check whether `field` is needed
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if no field is needed
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over field names in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Field names in ascending order
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.iter().collect();
        names.sort_unstable();
        names
    }
}

impl<'a> FromIterator<&'a str> for FieldsSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = FieldsSet::new();
        for field in iter {
            set.add(field);
        }
        set
    }
}

impl fmt::Display for FieldsSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.sorted().join(","))
    }
}
