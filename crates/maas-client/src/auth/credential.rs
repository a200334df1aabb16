//! MAAS API key parsing.

use std::fmt;
use std::str::FromStr;

use crate::error::MaasError;

/// The three parts of a MAAS API key.
///
/// MAAS hands out keys as `<consumer key>:<token key>:<token secret>`. The
/// consumer secret is always empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    consumer_key: String,
    token_key: String,
    token_secret: String,
}

impl Credential {
    #[must_use]
    pub fn new(
        consumer_key: impl Into<String>,
        token_key: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            token_key: token_key.into(),
            token_secret: token_secret.into(),
        }
    }

    #[must_use]
    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    #[must_use]
    pub fn token_key(&self) -> &str {
        &self.token_key
    }

    #[must_use]
    pub fn token_secret(&self) -> &str {
        &self.token_secret
    }
}

impl FromStr for Credential {
    type Err = MaasError;

    fn from_str(api_key: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = api_key.splitn(3, ':').collect();
        match parts.as_slice() {
            [consumer_key, token_key, token_secret] => {
                Ok(Self::new(*consumer_key, *token_key, *token_secret))
            }
            _ => Err(MaasError::Config(
                "invalid API key; expected \"<consumer key>:<token key>:<token secret>\""
                    .to_string(),
            )),
        }
    }
}

// Keep the token secret out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("consumer_key", &self.consumer_key)
            .field("token_key", &self.token_key)
            .field("token_secret", &"<redacted>")
            .finish()
    }
}
