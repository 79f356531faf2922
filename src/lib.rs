//! A small subject-property-object triple store.
//!
//! Facts are grouped per subject: each subject is one record in a
//! [KvStore], holding at most one object per property. Identifiers may be
//! given as CURIEs (`foaf:name`) which expand through the store's
//! [PrefixMapping].

pub mod backend;
pub mod config;
pub mod curie;
mod error;
pub mod record;
mod store;

pub use backend::{FjallStore, KvStore, MemoryStore};
pub use curie::{PrefixMapping, resolve};
pub use error::{Error, Result};
pub use record::SubjectRecord;
pub use store::{NULL_KEY, Triple, TripleStore};
