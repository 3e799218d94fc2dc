//! biblio Scopus - Retrieval and search APIs of Scopus
//!
//! Every type wraps one API. Retrievals are created with `fetch` and expose
//! the record through accessor methods; searches expose typed `results()`.
//! Responses are cached on disk as configured in [`shared::Config`].

mod abstract_retrieval;
mod affiliation_search;
mod author_retrieval;
mod author_search;
mod common;
mod format;
mod scopus_search;
mod search_options;

pub use abstract_retrieval::{
    AbstractOptions, AbstractRetrieval, Affiliation, Author, Chemical, ConfDate, Contributor,
    Correspondence, Funding, GroupMember, Issn, Reference, Sequencebank, ABSTRACT_ID_TYPES,
};
pub use affiliation_search::{AffiliationResult, AffiliationSearch};
pub use author_retrieval::{
    AuthorAffiliation, AuthorOptions, AuthorRetrieval, Coauthor, NameVariant,
};
pub use author_search::{AuthorResult, AuthorSearch};
pub use common::SubjectArea;
pub use scopus_search::{Document, ScopusSearch};
pub use search_options::SearchOptions;
