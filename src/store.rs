use std::fmt::Display;
use std::io::{self, Write};

use indexmap::IndexSet;
use tracing::debug;

use crate::backend::KvStore;
use crate::curie::{PrefixMapping, resolve};
use crate::error::{Error, Result};
use crate::record::SubjectRecord;

/// Key used when a subject or property resolves to no value.
pub const NULL_KEY: &str = "null";

/// One (subject, property, object) fact read back from a subject record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub subject: String,
    pub property: String,
    pub object: String,
}

impl Display for Triple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}> <{}> {:?}", self.subject, self.property, self.object)
    }
}

/// Triple store over a [KvStore].
///
/// Each subject is persisted under its IRI as a JSON object mapping property
/// IRIs to objects. Every string argument is expanded through the store's own
/// [PrefixMapping] before use.
///
/// Read-modify-write sequences (`push`, property removal) are not atomic with
/// respect to other writers sharing the same backing store.
pub struct TripleStore<S> {
    store: S,
    mapping: PrefixMapping,
}

impl<S: KvStore> TripleStore<S> {
    pub fn new(store: S) -> TripleStore<S> {
        TripleStore::with_mapping(store, PrefixMapping::default())
    }

    pub fn with_mapping(store: S, mapping: PrefixMapping) -> TripleStore<S> {
        TripleStore { store, mapping }
    }

    pub fn mapping(&self) -> &PrefixMapping {
        &self.mapping
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Binds `prefix` so that `prefix:local` expands to `iri` + `local`.
    ///
    /// ```
    /// # use triplestore::{MemoryStore, TripleStore};
    /// let mut st = TripleStore::new(MemoryStore::new());
    /// st.set_mapping("foaf", "http://xmlns.com/foaf/0.1/");
    /// st.push("http://sample.org/bob", "foaf:name", "Bob")?;
    /// assert_eq!(
    ///     vec!["Bob"],
    ///     st.get_values(Some("http://sample.org/bob"), Some("http://xmlns.com/foaf/0.1/name"))?
    /// );
    /// # Ok::<(), triplestore::Error>(())
    /// ```
    pub fn set_mapping(&mut self, prefix: impl Into<String>, iri: impl Into<String>) {
        self.mapping.set_mapping(prefix, iri);
    }

    fn resolve(&self, token: Option<&str>) -> Option<String> {
        resolve(&self.mapping, token)
    }

    fn read_record(&self, subject: &str) -> Result<Option<SubjectRecord>> {
        match self.store.get(subject)? {
            Some(json) => Ok(Some(SubjectRecord::from_json(subject, &json)?)),
            None => Ok(None),
        }
    }

    fn load_record(&self, subject: &str) -> Result<SubjectRecord> {
        self.read_record(subject)?
            .ok_or_else(|| Error::RecordNotFound(subject.to_owned()))
    }

    fn write_record(&self, subject: &str, record: &SubjectRecord) -> Result<()> {
        let json = record.to_json(subject)?;
        self.store.set(subject, &json)?;
        Ok(())
    }

    /// Every subject with its record, in store enumeration order.
    fn records(&self) -> Result<Vec<(String, SubjectRecord)>> {
        let mut records = vec![];
        for subject in self.store.keys()? {
            if let Some(record) = self.read_record(&subject)? {
                records.push((subject, record));
            }
        }
        Ok(records)
    }

    /// Subjects matching an optional property and value.
    ///
    /// With a property, the subject must have that property (equal to `value`
    /// when given). Without one, any property whose object equals `value`
    /// matches. With neither, every subject that has a record is returned,
    /// including records emptied by property removal.
    pub fn get_subjects(
        &self,
        property: Option<&str>,
        value: Option<&str>,
    ) -> Result<Vec<String>> {
        let property = self.resolve(property);
        let value = self.resolve(value);
        debug!(target: "triples", ?property, ?value, "get subjects");

        let mut subjects = vec![];
        for (subject, record) in self.records()? {
            let matched = match (&property, &value) {
                (Some(property), Some(value)) => record.get(property) == Some(value.as_str()),
                (Some(property), None) => record.contains(property),
                (None, Some(value)) => record.values().any(|object| object == value),
                // emptied records are listed too; only a deleted record disappears
                (None, None) => true,
            };
            if matched {
                subjects.push(subject);
            }
        }
        Ok(subjects)
    }

    /// Properties of `subject`, or the union of properties across every
    /// subject when absent.
    ///
    /// Fails with [Error::RecordNotFound] when the subject has no record.
    pub fn get_properties(&self, subject: Option<&str>) -> Result<Vec<String>> {
        if let Some(subject) = self.resolve(subject) {
            debug!(target: "triples", %subject, "get properties");
            let record = self.load_record(&subject)?;
            return Ok(record.properties().map(str::to_owned).collect());
        }

        debug!(target: "triples", "get all properties");
        let mut properties = IndexSet::new();
        for (_, record) in self.records()? {
            for property in record.properties() {
                properties.insert(property.to_owned());
            }
        }
        Ok(properties.into_iter().collect())
    }

    /// Objects of `subject` (or every subject), restricted to `property`
    /// when given. Duplicates across subjects are kept.
    pub fn get_values(
        &self,
        subject: Option<&str>,
        property: Option<&str>,
    ) -> Result<Vec<String>> {
        let subject = self.resolve(subject);
        let property = self.resolve(property);
        debug!(target: "triples", ?subject, ?property, "get values");

        let subjects = match subject {
            Some(subject) => vec![subject],
            None => self.store.keys()?,
        };
        let mut values = vec![];
        for subject in subjects {
            let Some(record) = self.read_record(&subject)? else {
                continue;
            };
            match &property {
                Some(property) => {
                    if let Some(object) = record.get(property) {
                        values.push(object.to_owned());
                    }
                }
                None => values.extend(record.values().map(str::to_owned)),
            }
        }
        Ok(values)
    }

    /// Stores a triple, replacing any object the subject already had for
    /// `property`.
    pub fn push(&self, subject: &str, property: &str, object: &str) -> Result<()> {
        let subject = self
            .resolve(Some(subject))
            .unwrap_or_else(|| NULL_KEY.to_owned());
        let property = self
            .resolve(Some(property))
            .unwrap_or_else(|| NULL_KEY.to_owned());
        let object = self.resolve(Some(object)).unwrap_or_default();
        debug!(target: "triples", %subject, %property, %object, "push");

        let mut record = self.read_record(&subject)?.unwrap_or_default();
        record.insert(property, object);
        self.write_record(&subject, &record)
    }

    /// Removes data selected by which arguments are present.
    ///
    /// * subject and property: the property of that subject; the record is
    ///   kept even when it becomes empty. Fails with [Error::NotFound] when
    ///   the subject has no record.
    /// * subject only: the whole record.
    /// * property only: that property from every subject; emptied records
    ///   are kept.
    /// * neither: everything in the backing store.
    pub fn remove(&self, subject: Option<&str>, property: Option<&str>) -> Result<()> {
        let subject = self.resolve(subject);
        let property = self.resolve(property);
        debug!(target: "triples", ?subject, ?property, "remove");

        match (subject, property) {
            (Some(subject), Some(property)) => {
                let Some(mut record) = self.read_record(&subject)? else {
                    return Err(Error::NotFound { subject, property });
                };
                record.remove(&property);
                self.write_record(&subject, &record)
            }
            (Some(subject), None) => Ok(self.store.remove(&subject)?),
            (None, Some(property)) => {
                for (subject, mut record) in self.records()? {
                    if record.remove(&property).is_some() {
                        self.write_record(&subject, &record)?;
                    }
                }
                Ok(())
            }
            (None, None) => Ok(self.store.clear()?),
        }
    }

    /// Every triple in store enumeration order.
    pub fn triples(&self) -> Result<Vec<Triple>> {
        let mut triples = vec![];
        for (subject, record) in self.records()? {
            for (property, object) in &record {
                triples.push(Triple {
                    subject: subject.clone(),
                    property: property.clone(),
                    object: object.clone(),
                });
            }
        }
        Ok(triples)
    }

    /// Prints `subject:record` for every stored subject to standard output.
    pub fn show(&self) -> Result<()> {
        self.show_to(io::stdout().lock())
    }

    pub fn show_to<W: Write>(&self, mut out: W) -> Result<()> {
        for index in 0..self.store.len()? {
            let Some(subject) = self.store.key_at(index)? else {
                break;
            };
            let record = self.store.get(&subject)?.unwrap_or_default();
            writeln!(out, "{subject}:{record}")?;
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{Result, bail};
    use fjall::{Config, Keyspace, PartitionCreateOptions};
    use tempfile::tempdir;

    use super::{NULL_KEY, Triple, TripleStore};
    use crate::Error;
    use crate::backend::{FjallStore, KvStore, MemoryStore};

    const FOAF: &str = "http://xmlns.com/foaf/0.1/";

    fn alice_and_bob() -> Result<TripleStore<MemoryStore>> {
        let st = TripleStore::new(MemoryStore::new());
        st.push("http://a", "http://name", "Alice")?;
        st.push("http://b", "http://name", "Bob")?;
        Ok(st)
    }

    #[test]
    fn push_then_get_values() -> Result<()> {
        let st = TripleStore::new(MemoryStore::new());
        st.push("http://s", "http://p", "o")?;
        assert_eq!(vec!["o"], st.get_values(Some("http://s"), Some("http://p"))?);
        Ok(())
    }

    #[test]
    fn push_overwrites_property() -> Result<()> {
        let st = TripleStore::new(MemoryStore::new());
        st.push("http://s", "http://p", "o")?;
        let once = st.store().get("http://s")?;
        st.push("http://s", "http://p", "o")?;
        assert_eq!(once, st.store().get("http://s")?);

        st.push("http://s", "http://p", "o2")?;
        assert_eq!(vec!["o2"], st.get_values(Some("http://s"), Some("http://p"))?);
        assert_eq!(vec!["http://p"], st.get_properties(Some("http://s"))?);
        Ok(())
    }

    #[test]
    fn push_expands_prefixes() -> Result<()> {
        let mut st = TripleStore::new(MemoryStore::new());
        st.set_mapping("foaf", FOAF);
        st.push("foaf:bob", "foaf:name", "Bob")?;
        st.push("foaf:bob", "foaf:knows", "foaf:alice")?;

        assert_eq!(vec!["http://xmlns.com/foaf/0.1/bob"], st.store().keys()?);
        assert_eq!(
            vec!["Bob"],
            st.get_values(
                Some("http://xmlns.com/foaf/0.1/bob"),
                Some("http://xmlns.com/foaf/0.1/name")
            )?
        );
        assert_eq!(
            vec!["http://xmlns.com/foaf/0.1/alice"],
            st.get_values(Some("foaf:bob"), Some("foaf:knows"))?
        );
        assert_eq!(
            vec!["http://xmlns.com/foaf/0.1/bob"],
            st.get_subjects(Some("foaf:knows"), Some("foaf:alice"))?
        );
        Ok(())
    }

    #[test]
    fn mappings_are_per_instance() -> Result<()> {
        let store = MemoryStore::new();
        let mut left = TripleStore::new(store.clone());
        let right = TripleStore::new(store);
        left.set_mapping("foaf", FOAF);
        assert!(right.mapping().is_empty());

        right.push("foaf:bob", "foaf:name", "Bob")?;
        assert_eq!(vec!["foaf:bob"], left.get_subjects(None, None)?);
        assert!(left.get_values(Some("foaf:bob"), None)?.is_empty());
        Ok(())
    }

    #[test]
    fn remove_property_keeps_record() -> Result<()> {
        let st = TripleStore::new(MemoryStore::new());
        st.push("http://s", "http://p", "o")?;
        st.remove(Some("http://s"), Some("http://p"))?;

        assert!(st.get_properties(Some("http://s"))?.is_empty());
        assert!(st.get_values(Some("http://s"), Some("http://p"))?.is_empty());
        assert_eq!(vec!["http://s"], st.get_subjects(None, None)?);
        assert_eq!(Some("{}".to_owned()), st.store().get("http://s")?);
        Ok(())
    }

    #[test]
    fn remove_subject_deletes_record() -> Result<()> {
        let st = alice_and_bob()?;
        st.remove(Some("http://a"), None)?;
        assert_eq!(vec!["http://b"], st.get_subjects(None, None)?);
        assert!(matches!(
            st.get_properties(Some("http://a")),
            Err(Error::RecordNotFound(subject)) if subject == "http://a"
        ));
        Ok(())
    }

    #[test]
    fn remove_everything() -> Result<()> {
        let st = alice_and_bob()?;
        st.remove(None, None)?;
        assert!(st.get_subjects(None, None)?.is_empty());
        assert!(st.store().is_empty()?);
        Ok(())
    }

    #[test]
    fn remove_property_everywhere() -> Result<()> {
        let st = alice_and_bob()?;
        st.push("http://a", "http://age", "30")?;
        st.remove(None, Some("http://name"))?;

        assert_eq!(vec!["http://age"], st.get_properties(None)?);
        assert_eq!(vec!["http://a", "http://b"], st.get_subjects(None, None)?);
        assert_eq!(vec!["http://a"], st.get_subjects(Some("http://age"), None)?);
        assert_eq!(Some("{}".to_owned()), st.store().get("http://b")?);
        Ok(())
    }

    #[test]
    fn remove_missing_subject_property() {
        let st = TripleStore::new(MemoryStore::new());
        match st.remove(Some("http://nonexistent"), Some("http://name")) {
            Err(error @ Error::NotFound { .. }) => {
                assert_eq!("Not found http://nonexistent:http://name", error.to_string());
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn filter_subjects() -> Result<()> {
        let st = alice_and_bob()?;
        st.push("http://c", "http://nick", "Bob")?;

        assert_eq!(vec!["http://b"], st.get_subjects(Some("http://name"), Some("Bob"))?);
        assert_eq!(
            vec!["http://a", "http://b"],
            st.get_subjects(Some("http://name"), None)?
        );
        assert_eq!(vec!["http://b", "http://c"], st.get_subjects(None, Some("Bob"))?);
        assert!(st.get_subjects(Some("http://name"), Some("Carol"))?.is_empty());
        Ok(())
    }

    #[test]
    fn emptied_records_stay_enumerable() -> Result<()> {
        let st = alice_and_bob()?;
        st.remove(Some("http://a"), Some("http://name"))?;
        assert_eq!(vec!["http://a", "http://b"], st.get_subjects(None, None)?);
        assert_eq!(vec!["http://b"], st.get_subjects(None, Some("Bob"))?);
        assert_eq!(vec!["Bob"], st.get_values(None, None)?);
        Ok(())
    }

    #[test]
    fn values_across_subjects() -> Result<()> {
        let st = alice_and_bob()?;
        st.push("http://c", "http://name", "Bob")?;
        st.push("http://a", "http://age", "30")?;

        assert_eq!(
            vec!["Alice", "Bob", "Bob"],
            st.get_values(None, Some("http://name"))?
        );
        assert_eq!(vec!["Alice", "30", "Bob", "Bob"], st.get_values(None, None)?);
        assert_eq!(vec!["Alice", "30"], st.get_values(Some("http://a"), None)?);
        assert!(st.get_values(Some("http://missing"), None)?.is_empty());
        Ok(())
    }

    #[test]
    fn properties_union_in_first_seen_order() -> Result<()> {
        let st = alice_and_bob()?;
        st.push("http://b", "http://age", "40")?;
        st.push("http://a", "http://mbox", "mailto:alice@example.org")?;
        assert_eq!(
            vec!["http://name", "http://mbox", "http://age"],
            st.get_properties(None)?
        );
        Ok(())
    }

    #[test]
    fn empty_arguments_are_absent() -> Result<()> {
        let st = alice_and_bob()?;
        assert_eq!(vec!["Alice", "Bob"], st.get_values(Some(""), Some(""))?);
        assert_eq!(2, st.get_subjects(Some(""), Some(""))?.len());

        st.push("", "", "")?;
        assert_eq!(Some(r#"{"null":""}"#.to_owned()), st.store().get(NULL_KEY)?);
        Ok(())
    }

    #[test]
    fn malformed_record_is_reported() -> Result<()> {
        let st = alice_and_bob()?;
        st.store().set("http://broken", "not json")?;
        assert!(matches!(
            st.get_subjects(None, None),
            Err(Error::MalformedRecord { subject, .. }) if subject == "http://broken"
        ));
        assert!(matches!(
            st.push("http://broken", "http://name", "x"),
            Err(Error::MalformedRecord { .. })
        ));
        // reads of other subjects are unaffected
        assert_eq!(vec!["Alice"], st.get_values(Some("http://a"), None)?);
        Ok(())
    }

    #[test]
    fn show_lists_records() -> Result<()> {
        let st = alice_and_bob()?;
        let mut out = vec![];
        st.show_to(&mut out)?;
        assert_eq!(
            "http://a:{\"http://name\":\"Alice\"}\nhttp://b:{\"http://name\":\"Bob\"}\n",
            String::from_utf8(out)?
        );
        Ok(())
    }

    #[test]
    fn triples_follow_store_order() -> Result<()> {
        let st = alice_and_bob()?;
        st.push("http://a", "http://age", "30")?;
        let triples = st.triples()?;
        assert_eq!(3, triples.len());
        assert_eq!(
            Triple {
                subject: "http://a".into(),
                property: "http://age".into(),
                object: "30".into(),
            },
            triples[1]
        );
        assert_eq!(r#"<http://b> <http://name> "Bob""#, triples[2].to_string());
        Ok(())
    }

    #[test]
    fn borrowed_fjall_store() -> Result<()> {
        let tmp_dir = tempdir()?;
        let keyspace = Keyspace::open(Config::new(tmp_dir.path()).temporary(true))?;
        let store = FjallStore::new(keyspace, "subjects")?;
        {
            let mut st = TripleStore::new(&store);
            st.set_mapping("foaf", FOAF);
            st.push("foaf:bob", "foaf:name", "Bob")?;
            st.push("foaf:alice", "foaf:name", "Alice")?;
            assert_eq!(
                vec!["http://xmlns.com/foaf/0.1/alice", "http://xmlns.com/foaf/0.1/bob"],
                st.get_subjects(Some("foaf:name"), None)?
            );
            st.remove(Some("foaf:alice"), None)?;
        }
        assert_eq!(vec!["http://xmlns.com/foaf/0.1/bob"], store.keys()?);
        Ok(())
    }

    /// Accepts reads but refuses every write.
    struct FullStore(MemoryStore);

    impl KvStore for FullStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.0.get(key)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            bail!("quota exceeded")
        }
        fn remove(&self, key: &str) -> Result<()> {
            self.0.remove(key)
        }
        fn clear(&self) -> Result<()> {
            self.0.clear()
        }
        fn len(&self) -> Result<usize> {
            self.0.len()
        }
        fn key_at(&self, index: usize) -> Result<Option<String>> {
            self.0.key_at(index)
        }
        fn keys(&self) -> Result<Vec<String>> {
            self.0.keys()
        }
    }

    #[test]
    fn backend_write_failure_is_passed_through() -> Result<()> {
        let memory = MemoryStore::new();
        memory.set("http://a", r#"{"http://name":"Alice"}"#)?;
        let st = TripleStore::new(FullStore(memory));

        match st.push("http://a", "http://name", "Bob") {
            Err(Error::Backend(error)) => assert_eq!("quota exceeded", error.to_string()),
            other => panic!("expected backend failure, got {other:?}"),
        }
        assert!(matches!(
            st.remove(None, Some("http://name")),
            Err(Error::Backend(_))
        ));
        // the failed writes left the record alone
        assert_eq!(vec!["Alice"], st.get_values(Some("http://a"), None)?);
        Ok(())
    }

    #[test]
    fn non_utf8_bytes_are_a_backend_failure() -> Result<()> {
        let tmp_dir = tempdir()?;
        let keyspace = Keyspace::open(Config::new(tmp_dir.path()).temporary(true))?;
        let raw = keyspace.open_partition("subjects", PartitionCreateOptions::default())?;
        raw.insert("http://bad", vec![0xffu8, 0xfe])?;

        let st = TripleStore::new(FjallStore::new(keyspace, "subjects")?);
        assert!(matches!(st.get_values(None, None), Err(Error::Backend(_))));
        assert!(matches!(
            st.get_properties(Some("http://bad")),
            Err(Error::Backend(_))
        ));
        Ok(())
    }
}
