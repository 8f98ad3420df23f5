//! HTTP requests and responses as plain data.
//!
//! # Design
//! The request bridge builds an `HttpRequest` from caller configuration and
//! hands it to a [`Transport`](crate::transport::Transport); the transport
//! answers with an `HttpResponse`. Neither type knows about the network, so
//! request construction and response shaping are testable without I/O.
//!
//! Headers are kept as an ordered list of pairs so a name may appear more
//! than once, matching how they travel on the wire.

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
///
/// `headers` holds one entry per received value, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

pub(crate) fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Canonical MIME form of a header name: `content-type` becomes
/// `Content-Type`.
///
/// The first letter and every letter after a hyphen are upper-cased, the
/// rest lower-cased. Names holding a byte that is not a valid token
/// character are returned unchanged.
pub fn canonical_header_name(name: &str) -> String {
    if !name.bytes().all(is_token_byte) {
        return name.to_string();
    }
    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
