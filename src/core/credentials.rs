use sha2::{Digest, Sha256};

/// Request-scoped credential forwarded to every upstream call made on behalf
/// of one inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    authorization: Option<String>,
}

impl Credentials {
    /// No inbound `Authorization` header.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Wrap a raw `Authorization` header value. Blank values count as absent.
    pub fn from_header(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            return Self::anonymous();
        }

        Self {
            authorization: Some(value),
        }
    }

    /// Header value, verbatim, as received from the caller
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    /// Stable cache partition key; never exposes the credential itself.
    pub fn fingerprint(&self) -> String {
        match &self.authorization {
            Some(value) => {
                let mut hasher = Sha256::new();
                hasher.update(value.as_bytes());
                hex::encode(hasher.finalize())
            }
            None => "anonymous".to_string(),
        }
    }
}
