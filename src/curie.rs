//! Compact IRI expansion
//!
//! A token is either an absolute IRI (it contains `://`), a CURIE of the form
//! `prefix:local`, or anything else, which is used verbatim. Only CURIEs whose
//! prefix is registered in a [`PrefixMapping`] are expanded.

use std::collections::BTreeMap;

/// Prefix to IRI-prefix bindings owned by a single store instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixMapping {
    prefixes: BTreeMap<String, String>,
}

impl PrefixMapping {
    pub fn new() -> PrefixMapping {
        PrefixMapping::default()
    }

    /// Registers `prefix`, replacing any previous binding.
    ///
    /// The IRI is not validated; expansion is plain string concatenation.
    pub fn set_mapping(&mut self, prefix: impl Into<String>, iri: impl Into<String>) {
        self.prefixes.insert(prefix.into(), iri.into());
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes
            .iter()
            .map(|(prefix, iri)| (prefix.as_str(), iri.as_str()))
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

impl<P, I> FromIterator<(P, I)> for PrefixMapping
where
    P: Into<String>,
    I: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (P, I)>>(iter: T) -> Self {
        let mut mapping = PrefixMapping::new();
        for (prefix, iri) in iter {
            mapping.set_mapping(prefix, iri);
        }
        mapping
    }
}

pub fn is_absolute_iri(token: &str) -> bool {
    token.contains("://")
}

/// Expands `token` against `mapping`.
///
/// Returns `None` only when the token is absent or empty. Tokens that cannot
/// be expanded are returned unchanged.
pub fn resolve(mapping: &PrefixMapping, token: Option<&str>) -> Option<String> {
    let token = token.filter(|token| !token.is_empty())?;
    if is_absolute_iri(token) {
        return Some(token.to_owned());
    }
    let Some((prefix, local)) = token.split_once(':') else {
        return Some(token.to_owned());
    };
    match mapping.get(prefix) {
        // an empty binding expands to nothing useful; keep the token
        Some(iri) if !iri.is_empty() => Some(format!("{iri}{local}")),
        _ => Some(token.to_owned()),
    }
}
