//! biblio ScienceDirect - APIs of ScienceDirect

mod article_entitlement;

pub use article_entitlement::{ArticleEntitlement, EntitlementOptions, ENTITLEMENT_ID_TYPES};
