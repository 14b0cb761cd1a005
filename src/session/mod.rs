//! Session management: credentials, cookies and authenticated requests.

mod auth;
mod core;
mod store;

pub use auth::{AuthMode, Credentials};
pub use self::core::{RawResponse, RequestBody, RequestOptions, Session, ANTI_CSRF_HEADER};
pub(crate) use self::core::parent_url;
pub use store::{CredentialStore, FileCredentialStore, StoredCredentials};
