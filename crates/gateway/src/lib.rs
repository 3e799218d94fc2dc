//! # biblio Gateway
//!
//! Sends requests to the Elsevier APIs: throttling, credential rotation,
//! retries and mapping of HTTP statuses to errors.

mod client;
mod keyring;
mod transport;

pub use client::{ApiClient, RateLimitHeader};
pub use keyring::KeyRing;
pub use transport::{HttpRequest, HttpResponse, MockTransport, ReqwestTransport, Transport};
