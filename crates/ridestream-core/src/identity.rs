//! The authenticated principal a notification stream is scoped to.

use secrecy::{ExposeSecret, SecretString};

/// Stable address of the current user (an email or user id).
///
/// Never blank: [`Principal::parse`] treats an empty or whitespace-only
/// address as "no principal".
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Principal(String);

impl Principal {
    /// Parse an address, returning `None` when it is blank.
    #[must_use]
    pub fn parse(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        if address.trim().is_empty() {
            None
        } else {
            Some(Self(address))
        }
    }

    /// The address, unescaped.
    pub fn address(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bearer credential for the subscription endpoint (redacted in Debug).
#[derive(Clone)]
pub struct BearerToken(SecretString);

impl BearerToken {
    /// Wrap a raw token. Blank tokens are treated as absent.
    #[must_use]
    pub fn parse(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(SecretString::from(token)))
        }
    }

    /// `Authorization` header value for this token.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0.expose_secret())
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

/// Principal plus optional credential, as published by the host's auth context.
#[derive(Clone, Debug)]
pub struct Identity {
    /// Who the stream is for.
    pub principal: Principal,
    /// Credential to attach, if the host has one.
    pub credential: Option<BearerToken>,
}

impl Identity {
    /// Identity without a credential.
    #[must_use]
    pub fn anonymous(principal: Principal) -> Self {
        Self {
            principal,
            credential: None,
        }
    }

    /// Identity with a credential.
    #[must_use]
    pub fn with_credential(principal: Principal, credential: Option<BearerToken>) -> Self {
        Self {
            principal,
            credential,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
