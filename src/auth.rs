//! Subsonic request credentials: parsing from query parameters and verification.
//!
//! Subsonic clients authenticate every request with either a plain (optionally
//! hex-encoded) password, or with a token computed as `md5(password + salt)`.
//! The token scheme only exists because the Subsonic protocol mandates it.

use std::collections::HashMap;

use md5::{Digest, Md5};

use crate::config::Config;

/// Prefix marking a hex-encoded password (`p=enc:68656c6c6f`).
const ENCODED_PASSWORD_PREFIX: &str = "enc:";

/// Authentication scheme selected by the parameters a client sent.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// Legacy scheme: `p` carries the password with each request.
    Password,
    /// Recommended scheme: `t` = md5(password + `s`).
    TokenSalt,
}

/// Proof of identity supplied with a request. Exactly one scheme, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Raw password bytes; an `enc:` value may decode to anything.
    Password(Vec<u8>),
    TokenSalt { token: String, salt: String },
}

impl Credentials {
    pub fn method(&self) -> AuthMethod {
        match self {
            Credentials::Password(_) => AuthMethod::Password,
            Credentials::TokenSalt { .. } => AuthMethod::TokenSalt,
        }
    }
}

/// Per-request identity parsed from the query string.
///
/// Only `parse_request_context` builds these, so `user`, `client` and `version`
/// are always non-empty and the credential fields are always populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user: String,
    pub client: String,
    pub version: String,
    pub credentials: Credentials,
}

impl RequestContext {
    pub fn auth_method(&self) -> AuthMethod {
        self.credentials.method()
    }
}

/// A mandatory query parameter was absent or empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("required parameter is missing: {0}")]
pub struct MissingParameter(pub &'static str);

fn required(params: &HashMap<String, String>, name: &'static str) -> Result<String, MissingParameter> {
    match params.get(name) {
        Some(v) if !v.is_empty() => Ok(v.clone()),
        _ => Err(MissingParameter(name)),
    }
}

/// Build a RequestContext from query parameters.
///
/// A non-empty (decoded) `p` wins over `t`/`s` regardless of whether they are present.
pub fn parse_request_context(
    params: &HashMap<String, String>,
) -> Result<RequestContext, MissingParameter> {
    let user = required(params, "u")?;
    let client = required(params, "c")?;
    let version = required(params, "v")?;

    let password = params.get("p").map(|p| decode_password(p)).unwrap_or_default();
    if !password.is_empty() {
        return Ok(RequestContext {
            user,
            client,
            version,
            credentials: Credentials::Password(password),
        });
    }

    let token = required(params, "t")?;
    let salt = required(params, "s")?;

    Ok(RequestContext {
        user,
        client,
        version,
        credentials: Credentials::TokenSalt { token, salt },
    })
}

/// Decode an `enc:`-prefixed hex password. Unprefixed values are returned as-is.
///
/// Invalid hex yields no bytes, so a mangled password behaves exactly like an
/// absent one. Valid hex is kept byte for byte, UTF-8 or not.
pub fn decode_password(raw: &str) -> Vec<u8> {
    match raw.strip_prefix(ENCODED_PASSWORD_PREFIX) {
        Some(encoded) => hex::decode(encoded).unwrap_or_default(),
        None => raw.as_bytes().to_vec(),
    }
}

/// Lowercase hex md5 of `password + salt`, as defined by the Subsonic API.
pub fn subsonic_token(password: &str, salt: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a parsed request against the configured Subsonic credentials.
pub fn authenticate(ctx: &RequestContext, config: &Config) -> bool {
    if ctx.user != config.subsonic_user {
        return false;
    }

    match &ctx.credentials {
        Credentials::Password(password) => {
            password.as_slice() == config.subsonic_password.as_bytes()
        }
        Credentials::TokenSalt { token, salt } => {
            *token == subsonic_token(&config.subsonic_password, salt)
        }
    }
}
