use indexmap::IndexMap;
use indexmap::map::Iter;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Every property stored for one subject, at most one object per property.
///
/// Properties keep their first insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectRecord {
    properties: IndexMap<String, String>,
}

impl SubjectRecord {
    pub fn new() -> SubjectRecord {
        SubjectRecord::default()
    }

    /// Parses a stored value. `subject` only labels the error.
    pub fn from_json(subject: &str, json: &str) -> Result<SubjectRecord> {
        serde_json::from_str(json).map_err(|source| Error::MalformedRecord {
            subject: subject.to_owned(),
            source,
        })
    }

    /// Encodes the record for storage. `subject` only labels the error.
    pub fn to_json(&self, subject: &str) -> Result<String> {
        serde_json::to_string(&self.properties).map_err(|source| Error::EncodeRecord {
            subject: subject.to_owned(),
            source,
        })
    }

    /// Sets `property`, returning the object it replaced.
    pub fn insert(
        &mut self,
        property: impl Into<String>,
        object: impl Into<String>,
    ) -> Option<String> {
        self.properties.insert(property.into(), object.into())
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        self.properties.shift_remove(property)
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.properties.get(property).map(String::as_str)
    }

    pub fn contains(&self, property: &str) -> bool {
        self.properties.contains_key(property)
    }

    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.properties.values().map(String::as_str)
    }

    pub fn iter(&self) -> Iter<'_, String, String> {
        self.properties.iter()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl<'a> IntoIterator for &'a SubjectRecord {
    type Item = (&'a String, &'a String);
    type IntoIter = Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.iter()
    }
}
