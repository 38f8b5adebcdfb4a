use std::borrow::Cow;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

// ── Constants ─────────────────────────────────────────────────────────────────

pub const SUBSONIC_NAMESPACE: &str = "http://subsonic.org/restapi";

/// Highest Subsonic API version we answer as. 1.13.0 introduced token auth.
pub const API_VERSION: &str = "1.13.0";

const XML_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

// ── Envelope builders ─────────────────────────────────────────────────────────

fn envelope(status: &str, inner_xml: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<subsonic-response xmlns="{ns}" status="{status}" version="{version}">{inner_xml}</subsonic-response>"#,
        ns = SUBSONIC_NAMESPACE,
        status = status,
        version = API_VERSION,
        inner_xml = inner_xml,
    )
}

/// Build a successful `<subsonic-response status="ok">` wrapping `inner_xml`.
pub fn subsonic_ok(inner_xml: &str) -> String {
    envelope("ok", inner_xml)
}

/// Wrap a response document into an HTTP 200 response with XML content-type.
pub fn ok_xml(body: String) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, XML_CONTENT_TYPE)], body).into_response()
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Subsonic protocol errors. Always delivered as HTTP 200 with a
/// `status="failed"` body; clients break on any other status.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SubsonicError {
    Generic,
    MissingParameter,
    Unauthorized,
    NotFound,
}

impl SubsonicError {
    pub fn code(self) -> u32 {
        match self {
            SubsonicError::Generic => 0,
            SubsonicError::MissingParameter => 10,
            SubsonicError::Unauthorized => 40,
            SubsonicError::NotFound => 70,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            SubsonicError::Generic => "A generic error.",
            SubsonicError::MissingParameter => "Required parameter is missing.",
            SubsonicError::Unauthorized => "Wrong username or password.",
            SubsonicError::NotFound => "The requested data was not found.",
        }
    }

    pub fn to_xml(self) -> String {
        envelope(
            "failed",
            &format!(
                r#"<error code="{}" message="{}"/>"#,
                self.code(),
                xml_escape(self.message())
            ),
        )
    }
}

impl IntoResponse for SubsonicError {
    fn into_response(self) -> Response {
        ok_xml(self.to_xml())
    }
}

// ── IDs ───────────────────────────────────────────────────────────────────────

/// Subsonic IDs are opaque strings; ours are the hex-encoded MPD path so that
/// every directory and song is addressable without a lookup table.
pub fn encode_id(path: &str) -> String {
    hex::encode(path.as_bytes())
}

/// Reverse of `encode_id`. None for anything that is not hex-encoded UTF-8.
pub fn decode_id(id: &str) -> Option<String> {
    let bytes = hex::decode(id).ok()?;
    String::from_utf8(bytes).ok()
}

// ── XML escaping ──────────────────────────────────────────────────────────────

/// Escape `&`, `<`, `>`, `"` and `'` for XML text and attribute values.
pub fn xml_escape(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}
