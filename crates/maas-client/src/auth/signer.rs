//! OAuth1 HMAC-SHA1 header construction.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::Method;
use sha1::Sha1;
use uuid::Uuid;

use super::credential::Credential;
use crate::params::Params;

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// Signs MAAS requests with a [`Credential`].
#[derive(Debug, Clone)]
pub struct OAuthSigner {
    credential: Credential,
}

impl OAuthSigner {
    #[must_use]
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    /// Build an `Authorization` header value with a fresh nonce and the
    /// current time.
    #[must_use]
    pub fn sign(&self, method: &Method, url: &str, params: &Params) -> Option<String> {
        let nonce = Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().timestamp();
        self.sign_with(method, url, params, &nonce, timestamp)
    }

    /// Build an `Authorization` header value for a fixed nonce and timestamp.
    ///
    /// PUT requests never include the caller's parameters in the signature;
    /// MAAS verifies PUT signatures over the OAuth parameters alone.
    #[must_use]
    pub fn sign_with(
        &self,
        method: &Method,
        url: &str,
        params: &Params,
        nonce: &str,
        timestamp: i64,
    ) -> Option<String> {
        let mut oauth: Vec<(String, String)> = vec![
            ("oauth_nonce".into(), nonce.into()),
            (
                "oauth_consumer_key".into(),
                self.credential.consumer_key().into(),
            ),
            ("oauth_signature_method".into(), SIGNATURE_METHOD.into()),
            ("oauth_timestamp".into(), timestamp.to_string()),
            ("oauth_token".into(), self.credential.token_key().into()),
            ("oauth_version".into(), OAUTH_VERSION.into()),
        ];

        if *method != Method::PUT {
            for (key, values) in params.values() {
                if let Some(first) = values.first() {
                    oauth.push((key.to_string(), first.clone()));
                }
            }
        }

        let parameter_string = canonical_parameter_string(&oauth);
        let base = signature_base_string(method, url, &parameter_string);
        // Consumer secret is always empty for MAAS keys.
        let signing_key = format!("{}&{}", encode(""), encode(self.credential.token_secret()));
        let signature = calculate_signature(&base, &signing_key)?;
        oauth.push(("oauth_signature".into(), signature));

        let fields: Vec<String> = oauth
            .iter()
            .map(|(key, value)| format!(r#"{key}="{}""#, encode(value)))
            .collect();
        Some(format!("OAuth {}", fields.join(", ")))
    }
}

/// Percent-encode with the RFC 3986 unreserved set; space becomes `%20`.
fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Sorted `k=v&k=v` string over all signing parameters.
pub(crate) fn canonical_parameter_string(params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();
    sorted
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// `METHOD&enc(url without query)&enc(parameter string)`.
pub(crate) fn signature_base_string(method: &Method, url: &str, parameter_string: &str) -> String {
    let path = url.split('?').next().unwrap_or(url);
    format!(
        "{}&{}&{}",
        method.as_str().to_uppercase(),
        encode(path),
        encode(parameter_string)
    )
}

fn calculate_signature(base: &str, key: &str) -> Option<String> {
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).ok()?;
    mac.update(base.as_bytes());
    Some(STANDARD.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://maas.local/MAAS/api/2.0/users/";

    fn signer() -> OAuthSigner {
        OAuthSigner::new(Credential::new("ck", "tk", "ts"))
    }

    fn header_field<'a>(header: &'a str, key: &str) -> &'a str {
        let marker = format!(r#"{key}=""#);
        let start = header.find(&marker).unwrap() + marker.len();
        let end = header[start..].find('"').unwrap() + start;
        &header[start..end]
    }

    #[test]
    fn test_signature_is_hmac_sha1_over_base_string() {
        let params = Params::new().with("op", "whoami");
        let header = signer()
            .sign_with(&Method::GET, URL, &params, "nonce", 1_700_000_000)
            .unwrap();

        let base = "GET&http%3A%2F%2Fmaas.local%2FMAAS%2Fapi%2F2.0%2Fusers%2F&\
            oauth_consumer_key%3Dck%26oauth_nonce%3Dnonce%26\
            oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1700000000%26\
            oauth_token%3Dtk%26oauth_version%3D1.0%26op%3Dwhoami";
        let mut mac = HmacSha1::new_from_slice(b"&ts").unwrap();
        mac.update(base.as_bytes());
        let expected = STANDARD.encode(mac.finalize().into_bytes());

        let signature = header_field(&header, "oauth_signature");
        assert_eq!(urlencoding::decode(signature).unwrap(), expected);
    }

    #[test]
    fn test_signing_is_deterministic_for_fixed_nonce_and_timestamp() {
        let params = Params::new().with("op", "deploy");
        let a = signer().sign_with(&Method::POST, URL, &params, "n1", 42);
        let b = signer().sign_with(&Method::POST, URL, &params, "n1", 42);
        assert_eq!(a, b);
    }

    #[test]
    fn test_signing_varies_with_nonce_and_timestamp() {
        let params = Params::new();
        let base = signer().sign_with(&Method::GET, URL, &params, "n1", 42);
        let other_nonce = signer().sign_with(&Method::GET, URL, &params, "n2", 42);
        let other_time = signer().sign_with(&Method::GET, URL, &params, "n1", 43);
        assert_ne!(base, other_nonce);
        assert_ne!(base, other_time);
    }

    #[test]
    fn test_put_ignores_caller_params() {
        let bare = Params::new();
        let extra = Params::new().with("hostname", "node-1").with("swap_size", "0");
        let a = signer().sign_with(&Method::PUT, URL, &bare, "n", 1);
        let b = signer().sign_with(&Method::PUT, URL, &extra, "n", 1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_non_put_includes_caller_params() {
        let bare = Params::new();
        let extra = Params::new().with("hostname", "node-1");
        let a = signer().sign_with(&Method::POST, URL, &bare, "n", 1);
        let b = signer().sign_with(&Method::POST, URL, &extra, "n", 1);
        assert_ne!(a, b);
        assert!(b.unwrap().contains(r#"hostname="node-1""#));
    }

    #[test]
    fn test_query_is_stripped_from_base_url() {
        let with_query = signature_base_string(&Method::GET, &format!("{URL}?op=whoami"), "x=1");
        let without = signature_base_string(&Method::GET, URL, "x=1");
        assert_eq!(with_query, without);
        assert!(without.starts_with("GET&http%3A%2F%2F"));
    }

    #[test]
    fn test_parameter_string_is_sorted_and_encodes_space_as_percent_20() {
        let params = vec![
            ("name".to_string(), "a b+c".to_string()),
            ("domain".to_string(), "maas".to_string()),
        ];
        assert_eq!(
            canonical_parameter_string(&params),
            "domain=maas&name=a%20b%2Bc"
        );
    }

    #[test]
    fn test_header_lists_oauth_fields_in_insertion_order() {
        let header = signer()
            .sign_with(&Method::GET, URL, &Params::new(), "n", 7)
            .unwrap();
        assert!(header.starts_with(r#"OAuth oauth_nonce="n", oauth_consumer_key="ck""#));
        assert!(header.contains(r#"oauth_signature_method="HMAC-SHA1""#));
        assert!(header.contains(r#"oauth_timestamp="7""#));
        assert!(header.contains(r#"oauth_version="1.0""#));
        let signature_pos = header.find("oauth_signature=").unwrap();
        assert!(signature_pos > header.find("oauth_version=").unwrap());
    }
}
