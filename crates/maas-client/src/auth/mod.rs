//! OAuth1 request signing for the MAAS API.
//!
//! MAAS authenticates every call with an `Authorization: OAuth ...` header
//! signed with HMAC-SHA1 over the method, URL and parameters. Signatures are
//! only accepted within a timestamp window, so long transfers use a
//! [`HeaderRefresher`] that re-signs the header periodically.

mod credential;
mod refresher;
mod signer;

pub use credential::Credential;
pub use refresher::{HeaderRefresher, REFRESH_INTERVAL};
pub use signer::OAuthSigner;

use reqwest::Method;

use crate::params::Params;

/// Build a fresh `Authorization` header value for one request.
///
/// Returns `None` when `api_key` is not a valid three-part credential; the
/// request is then sent unauthenticated and MAAS rejects it.
#[must_use]
pub fn authorization_header(
    api_key: &str,
    method: &Method,
    url: &str,
    params: &Params,
) -> Option<String> {
    let credential: Credential = api_key.parse().ok()?;
    OAuthSigner::new(credential).sign(method, url, params)
}
