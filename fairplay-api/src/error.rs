use serde_json::json;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response, with the message the server gave
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Invalid response from server: {0}")]
    Parse(String),
}

impl Error {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::Network(_) | Error::Parse(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(401)
    }

    pub fn not_found(what: &str) -> Error {
        Error::Http {
            status: 404,
            message: format!("{what} not found"),
        }
    }

    /// Builds the error for a non-2xx response. The message is taken from the body's
    /// `error` field, then its `message` field, then defaults to `HTTP <status>`.
    pub fn from_response(status: u16, body: &[u8]) -> Error {
        let data: Option<serde_json::Value> = serde_json::from_slice(body).ok();
        let message = data
            .as_ref()
            .and_then(|data| {
                ["error", "message"].iter().find_map(|field| {
                    data.get(field)
                        .and_then(|m| m.as_str())
                        .filter(|m| !m.is_empty())
                })
            })
            .map(String::from)
            .unwrap_or_else(|| format!("HTTP {status}"));
        Error::Http { status, message }
    }

    /// Body a server would send along with this error
    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&json!({ "error": self.to_string() })).expect("serializing error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_from_body() {
        assert_eq!(
            Error::from_response(403, br#"{"error":"Forbidden","message":"ignored"}"#),
            Error::Http {
                status: 403,
                message: String::from("Forbidden")
            }
        );
        assert_eq!(
            Error::from_response(400, br#"{"message":"Content is required"}"#).to_string(),
            "Content is required"
        );
        assert_eq!(
            Error::from_response(502, b"<html>bad gateway</html>").to_string(),
            "HTTP 502"
        );
        assert_eq!(Error::from_response(500, b"").to_string(), "HTTP 500");
        assert!(Error::from_response(401, b"{}").is_unauthorized());
    }

    #[test]
    fn contents_parse_back() {
        let err = Error::not_found("Comment");
        assert_eq!(
            Error::from_response(404, &err.contents()),
            Error::Http {
                status: 404,
                message: String::from("Comment not found")
            }
        );
    }
}
