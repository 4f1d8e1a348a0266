//! Subscription endpoint construction.
//!
//! The gateway exposes one push stream per user at
//! `/api/notifications/subscribe/{address}`. The address is escaped the way
//! browsers escape a URI component, so `@`, `+` and `/` never leak into the
//! path structure.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Url;

use ridestream_core::{EndpointError, Principal};

/// Path prefix of the subscription endpoint, relative to the base URL.
pub const SUBSCRIBE_PATH: &str = "api/notifications/subscribe";

/// Characters left unescaped in a URI component: `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Escape an identity address for use as a single path segment.
pub fn encode_address(address: &str) -> String {
    utf8_percent_encode(address, URI_COMPONENT).to_string()
}

/// Validated gateway base URL that produces per-principal stream targets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionEndpoint {
    base: Url,
}

impl SubscriptionEndpoint {
    /// Validate `base_url`. It must be an `http` or `https` URL; any path it
    /// carries is kept as a prefix.
    pub fn new(base_url: &str) -> Result<Self, EndpointError> {
        let base = Url::parse(base_url.trim()).map_err(|e| EndpointError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(EndpointError::UnsupportedScheme(base_url.to_owned()));
        }
        Ok(Self { base })
    }

    /// The validated base URL.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Stream target for `principal`.
    pub fn target_for(&self, principal: &Principal) -> Url {
        let mut target = self.base.clone();
        let prefix = self.base.path().trim_end_matches('/');
        let encoded = encode_address(principal.address());
        target.set_path(&format!("{prefix}/{SUBSCRIBE_PATH}/{encoded}"));
        target.set_query(None);
        target.set_fragment(None);
        target
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn principal(address: &str) -> Principal {
        Principal::parse(address).unwrap()
    }

    // ── encode_address ──────────────────────────────────────────────

    #[test]
    fn email_at_sign_is_escaped() {
        assert_eq!(encode_address("rider@example.com"), "rider%40example.com");
    }

    #[test]
    fn reserved_characters_are_escaped() {
        assert_eq!(encode_address("a b+c/d?e#f"), "a%20b%2Bc%2Fd%3Fe%23f");
    }

    #[test]
    fn unreserved_marks_are_kept() {
        assert_eq!(encode_address("o'neil(1)!~*_-."), "o'neil(1)!~*_-.");
    }

    #[test]
    fn non_ascii_is_utf8_escaped() {
        assert_eq!(encode_address("é"), "%C3%A9");
    }

    // ── SubscriptionEndpoint ────────────────────────────────────────

    #[test]
    fn target_for_plain_base() {
        let endpoint = SubscriptionEndpoint::new("http://localhost:8080").unwrap();
        let target = endpoint.target_for(&principal("rider@example.com"));
        assert_eq!(
            target.as_str(),
            "http://localhost:8080/api/notifications/subscribe/rider%40example.com"
        );
    }

    #[test]
    fn target_keeps_base_path_prefix() {
        let endpoint = SubscriptionEndpoint::new("https://gw.example.com/v1/").unwrap();
        let target = endpoint.target_for(&principal("42"));
        assert_eq!(
            target.as_str(),
            "https://gw.example.com/v1/api/notifications/subscribe/42"
        );
    }

    #[test]
    fn target_drops_base_query_and_fragment() {
        let endpoint = SubscriptionEndpoint::new("http://h:1/?debug=1#x").unwrap();
        let target = endpoint.target_for(&principal("u"));
        assert_eq!(target.as_str(), "http://h:1/api/notifications/subscribe/u");
    }

    #[test]
    fn escaped_segment_survives_url_serialization() {
        let endpoint = SubscriptionEndpoint::new("http://localhost:8080").unwrap();
        let target = endpoint.target_for(&principal("a/b c"));
        assert_eq!(target.path(), "/api/notifications/subscribe/a%2Fb%20c");
    }

    #[test]
    fn rejects_garbage() {
        assert_matches!(
            SubscriptionEndpoint::new("not a url"),
            Err(EndpointError::InvalidUrl { .. })
        );
    }

    #[test]
    fn rejects_non_http_scheme() {
        assert_matches!(
            SubscriptionEndpoint::new("ftp://files.example.com"),
            Err(EndpointError::UnsupportedScheme(_))
        );
        assert_matches!(
            SubscriptionEndpoint::new("mailto:ops@example.com"),
            Err(EndpointError::UnsupportedScheme(_))
        );
    }
}
