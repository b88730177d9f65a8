//! Database access: the [`Database`] trait and its ureq-backed
//! implementation.
//!
//! The engine only ever needs three operations against CouchDB, so the trait
//! stays that narrow. [`HttpDatabase`] implements them over blocking HTTP;
//! tests substitute scripted in-memory implementations.

use serde_json::Value;
use url::Url;

use crate::error::EngineError;

/// HTTP Basic credentials for the target database.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    /// Wrap user and password; `None` when either half is absent, so requests
    /// go out unauthenticated unless both were supplied.
    pub fn from_parts(user: Option<String>, password: Option<String>) -> Option<Self> {
        match (user, password) {
            (Some(user), Some(password)) => Some(Self { user, password }),
            _ => None,
        }
    }

    fn basic_header(&self) -> String {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine as _;
        let encoded = STANDARD.encode(format!("{}:{}", self.user, self.password));
        format!("Basic {encoded}")
    }
}

/// A validated absolute http(s) URL pointing at one database.
///
/// Validation happens here, before any I/O: the raw string must parse as an
/// absolute URL with scheme `http` or `https`. A trailing slash is appended
/// so joins keep the database path segment.
#[derive(Debug, Clone)]
pub struct DatabaseUrl(Url);

impl DatabaseUrl {
    pub fn parse(raw: &str) -> Result<Self, EngineError> {
        let mut normalized = raw.to_owned();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let url = Url::parse(&normalized).map_err(|e| EngineError::InvalidUrl {
            url: raw.to_owned(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(Self(url)),
            other => Err(EngineError::InvalidUrl {
                url: raw.to_owned(),
                reason: format!("scheme '{other}' is not http or https"),
            }),
        }
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    fn join(&self, segment: &str) -> Result<Url, EngineError> {
        self.0.join(segment).map_err(|e| EngineError::InvalidUrl {
            url: self.0.to_string(),
            reason: e.to_string(),
        })
    }
}

/// The three database operations the engine depends on.
pub trait Database {
    /// Raw `_all_docs` rows for the design-document id range, bodies
    /// included.
    fn design_document_rows(&self) -> Result<Vec<Value>, EngineError>;

    /// One page of raw `_all_docs` rows across the whole database, bodies
    /// excluded.
    fn all_docs_page(&self, limit: usize) -> Result<Vec<Value>, EngineError>;

    /// One `_bulk_docs` round trip covering every document in `docs`.
    fn bulk_write(&self, docs: &[Value]) -> Result<(), EngineError>;
}

/// Blocking CouchDB client over ureq.
///
/// Credentials, when present, are attached to every outgoing request by the
/// single [`HttpDatabase::send`]/[`HttpDatabase::authorize`] path; no call
/// site attaches them itself.
pub struct HttpDatabase {
    url: DatabaseUrl,
    credentials: Option<Credentials>,
    agent: ureq::Agent,
}

impl HttpDatabase {
    pub fn new(url: DatabaseUrl, credentials: Option<Credentials>) -> Self {
        Self {
            url,
            credentials,
            agent: ureq::agent(),
        }
    }

    fn authorize(&self, request: ureq::Request) -> ureq::Request {
        match &self.credentials {
            Some(credentials) => request.set("Authorization", &credentials.basic_header()),
            None => request,
        }
    }

    fn get_json(&self, target: &Url) -> Result<Value, EngineError> {
        let request = self.authorize(self.agent.get(target.as_str()));
        let response = request.call().map_err(|e| request_err(target, e))?;
        response
            .into_json()
            .map_err(|e| response_err(target, &e.to_string()))
    }

    fn rows_of(&self, target: &Url, body: Value) -> Result<Vec<Value>, EngineError> {
        match body {
            Value::Object(mut object) => match object.remove("rows") {
                Some(Value::Array(rows)) => Ok(rows),
                _ => Err(response_err(target, "missing `rows` array")),
            },
            _ => Err(response_err(target, "response is not a JSON object")),
        }
    }
}

impl Database for HttpDatabase {
    fn design_document_rows(&self) -> Result<Vec<Value>, EngineError> {
        let mut target = self.url.join("_all_docs")?;
        target
            .query_pairs_mut()
            .append_pair("startkey", "\"_design/\"")
            .append_pair("endkey", "\"_design0\"")
            .append_pair("include_docs", "true");
        let body = self.get_json(&target)?;
        self.rows_of(&target, body)
    }

    fn all_docs_page(&self, limit: usize) -> Result<Vec<Value>, EngineError> {
        let mut target = self.url.join("_all_docs")?;
        target
            .query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        let body = self.get_json(&target)?;
        self.rows_of(&target, body)
    }

    fn bulk_write(&self, docs: &[Value]) -> Result<(), EngineError> {
        let target = self.url.join("_bulk_docs")?;
        let payload = serde_json::json!({ "docs": docs });
        let request = self.authorize(self.agent.post(target.as_str()));
        request
            .send_json(payload)
            .map_err(|e| request_err(&target, e))?;
        Ok(())
    }
}

fn request_err(target: &Url, err: ureq::Error) -> EngineError {
    match err {
        ureq::Error::Status(status, _) => EngineError::Http {
            status,
            url: target.to_string(),
        },
        ureq::Error::Transport(transport) => EngineError::Transport {
            url: target.to_string(),
            message: transport.to_string(),
        },
    }
}

fn response_err(target: &Url, message: &str) -> EngineError {
    EngineError::UnexpectedResponse {
        url: target.to_string(),
        message: message.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_http_and_https() {
        assert!(DatabaseUrl::parse("http://example.com:5984/db1").is_ok());
        assert!(DatabaseUrl::parse("https://example.com/db1").is_ok());
    }

    #[test]
    fn parse_appends_trailing_slash() {
        let url = DatabaseUrl::parse("http://example.com:5984/db1").expect("parse");
        assert_eq!(url.as_url().as_str(), "http://example.com:5984/db1/");
    }

    #[test]
    fn parse_rejects_relative_url() {
        let err = DatabaseUrl::parse("db1/documents").unwrap_err();
        assert!(matches!(err, EngineError::InvalidUrl { .. }));
    }

    #[test]
    fn parse_rejects_non_http_scheme() {
        let err = DatabaseUrl::parse("ftp://example.com/db1").unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidUrl { reason, .. } if reason.contains("ftp")
        ));
    }

    #[test]
    fn credentials_require_both_parts() {
        assert!(Credentials::from_parts(Some("admin".into()), Some("pw".into())).is_some());
        assert!(Credentials::from_parts(Some("admin".into()), None).is_none());
        assert!(Credentials::from_parts(None, Some("pw".into())).is_none());
        assert!(Credentials::from_parts(None, None).is_none());
    }

    #[test]
    fn basic_header_encodes_user_and_password() {
        let credentials = Credentials {
            user: "admin".into(),
            password: "passw0rd".into(),
        };
        // base64("admin:passw0rd")
        assert_eq!(credentials.basic_header(), "Basic YWRtaW46cGFzc3cwcmQ=");
    }
}
