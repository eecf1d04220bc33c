use std::fmt::{self, Display};

use crate::errors::AttributeError;

///
/// One key/value pair of an annotation line.
///
/// `values` is the value split on the list separator `,` before any unescaping,
/// so an escaped comma (`%2C` in GFF3) stays inside its item.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub key: String,
    pub value: String,
    pub values: Vec<String>,
}

///
/// An ordered bag of string attributes, as found in column 9 of GFF/GTF files.
///
/// Values are stored as strings. Typed access goes through [`Attributes::get_int`]
/// and [`Attributes::get_bool`], which fail on malformed values instead of
/// silently returning nothing.
///
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<Attribute>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an attribute. Its list items are the value split on `,`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let values = value.split(',').map(str::to_string).collect();
        self.insert_entry(key.into(), value, values);
    }

    ///
    /// Insert or replace an attribute from its already separated list items.
    /// The plain value is the items joined with `,`.
    ///
    pub fn insert_list(&mut self, key: impl Into<String>, values: Vec<String>) {
        let value = values.join(",");
        self.insert_entry(key.into(), value, values);
    }

    /// Replacing keeps the original position.
    fn insert_entry(&mut self, key: String, value: String, values: Vec<String>) {
        match self.entries.iter_mut().find(|a| a.key == key) {
            Some(existing) => {
                existing.value = value;
                existing.values = values;
            }
            None => self.entries.push(Attribute { key, value, values }),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Attribute> {
        let pos = self.entries.iter().position(|a| a.key == key)?;
        Some(self.entries.remove(pos))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_attribute(key).map(|a| a.value.as_str())
    }

    /// The list items of `key`.
    pub fn get_list(&self, key: &str) -> Option<&[String]> {
        self.get_attribute(key).map(|a| a.values.as_slice())
    }

    pub fn get_attribute(&self, key: &str) -> Option<&Attribute> {
        self.entries.iter().find(|a| a.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Like [`Attributes::get`] but a missing key is an error.
    pub fn require(&self, key: &str) -> Result<&str, AttributeError> {
        self.get(key)
            .ok_or_else(|| AttributeError::Missing(key.to_string()))
    }

    pub fn get_int(&self, key: &str) -> Result<Option<i64>, AttributeError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| AttributeError::Malformed {
                    key: key.to_string(),
                    value: value.to_string(),
                    expected: "integer",
                }),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, AttributeError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => match value.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Some(true)),
                "false" | "no" | "0" => Ok(Some(false)),
                _ => Err(AttributeError::Malformed {
                    key: key.to_string(),
                    value: value.to_string(),
                    expected: "boolean",
                }),
            },
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (key, value) in iter {
            attributes.insert(key, value);
        }
        attributes
    }
}

/// `key=value` pairs joined by `;`.
impl Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, attribute) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ";")?;
            }
            write!(f, "{}={}", attribute.key, attribute.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn attributes() -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert("level", "3");
        attributes.insert("Parent", "tx1,tx2");
        attributes.insert("pseudo", "true");
        attributes
    }

    #[rstest]
    fn test_get_int(attributes: Attributes) {
        assert_eq!(attributes.get_int("level"), Ok(Some(3)));
        assert_eq!(attributes.get_int("gene_id"), Ok(None));
        assert_eq!(
            attributes.get_int("Parent"),
            Err(AttributeError::Malformed {
                key: "Parent".to_string(),
                value: "tx1,tx2".to_string(),
                expected: "integer",
            })
        );
    }

    #[rstest]
    fn test_get_bool(attributes: Attributes) {
        assert_eq!(attributes.get_bool("pseudo"), Ok(Some(true)));
        assert!(attributes.get_bool("level").is_err());
    }

    #[rstest]
    fn test_require(attributes: Attributes) {
        assert_eq!(attributes.require("Parent"), Ok("tx1,tx2"));
        assert_eq!(
            attributes.require("gene_id"),
            Err(AttributeError::Missing("gene_id".to_string()))
        );
    }

    #[rstest]
    fn test_insert_replaces_in_place(mut attributes: Attributes) {
        attributes.insert("level", "1");
        assert_eq!(attributes.len(), 3);
        assert_eq!(attributes.iter().next().unwrap().value, "1");
    }

    #[rstest]
    fn test_list_items(attributes: Attributes) {
        assert_eq!(
            attributes.get_list("Parent"),
            Some(&["tx1".to_string(), "tx2".to_string()][..])
        );
        assert_eq!(attributes.get_list("level"), Some(&["3".to_string()][..]));
    }

    #[rstest]
    fn test_list_item_holding_a_comma() {
        let mut attributes = Attributes::new();
        attributes.insert_list("Parent", vec!["tx,weird".to_string(), "tx2".to_string()]);
        assert_eq!(attributes.get("Parent"), Some("tx,weird,tx2"));
        assert_eq!(attributes.get_list("Parent").map(|items| items.len()), Some(2));
    }

    #[rstest]
    fn test_display(attributes: Attributes) {
        assert_eq!(attributes.to_string(), "level=3;Parent=tx1,tx2;pseudo=true");
    }
}
