use serde::{Deserialize, Deserializer, Serialize};

/// Ordered genre list with set semantics.
///
/// Insertion order is preserved, values are trimmed, blanks are ignored and
/// duplicates are rejected. Membership is case-sensitive: "Drama" and "drama"
/// are two categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Categories(Vec<String>);

impl Categories {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build from arbitrary values, dropping blanks and later duplicates
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut categories = Self::new();
        for value in values {
            categories.insert(value.as_ref());
        }
        categories
    }

    /// Returns false when the trimmed value is blank or already present
    pub fn insert(&mut self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() || self.contains(value) {
            return false;
        }
        self.0.push(value.to_string());
        true
    }

    pub fn remove(&mut self, value: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|c| c != value);
        self.0.len() != before
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|c| c == value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for Categories {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<String>::deserialize(deserializer)?;
        Ok(Self::from_values(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rejects_duplicates_and_blanks() {
        let mut categories = Categories::new();
        assert!(categories.insert("Thriller"));
        assert!(!categories.insert("Thriller"));
        assert!(!categories.insert("  Thriller "));
        assert!(!categories.insert("   "));
        assert_eq!(categories.len(), 1);
    }

    #[test]
    fn test_membership_is_case_sensitive() {
        let mut categories = Categories::new();
        categories.insert("Drama");
        assert!(categories.insert("drama"));
        assert_eq!(categories.as_slice(), &["Drama".to_string(), "drama".to_string()]);
    }

    #[test]
    fn test_from_values_keeps_first_occurrence_order() {
        let categories = Categories::from_values(["Comedy", "Action", "Comedy", "Horror"]);
        let values: Vec<&str> = categories.iter().collect();
        assert_eq!(values, vec!["Comedy", "Action", "Horror"]);
    }

    #[test]
    fn test_remove() {
        let mut categories = Categories::from_values(["Comedy", "Action"]);
        assert!(categories.remove("Comedy"));
        assert!(!categories.remove("Comedy"));
        assert_eq!(categories.as_slice(), &["Action".to_string()]);
    }

    #[test]
    fn test_deserialize_dedupes() {
        let categories: Categories = serde_json::from_str(r#"["A", "B", "A"]"#).unwrap();
        assert_eq!(categories.len(), 2);
    }
}
