//! Redirect decoding for both callback transports.

use crate::payload::AuthCallbackPayload;
use tracing::{debug, warn};
use url::Url;

/// Host component of a deep-link callback URI (`scheme://auth/callback`).
const DEEP_LINK_HOST: &str = "auth";
/// Path component of a deep-link callback URI.
const DEEP_LINK_PATH: &str = "/callback";
/// Query parameter carrying the encoded payload.
const DATA_PARAM: &str = "data";

/// Decode a raw `data` parameter into a payload.
///
/// Accepts either plain JSON or a percent-encoded JSON string. Decoding or
/// parsing failure never propagates: the caller always gets a payload, with
/// the synthetic failure shape standing in for garbage input.
pub fn decode_redirect_data(raw: &str) -> AuthCallbackPayload {
    if let Ok(payload) = serde_json::from_str::<AuthCallbackPayload>(raw) {
        return payload;
    }

    let decoded = percent_decode(raw);
    match serde_json::from_str::<AuthCallbackPayload>(&decoded) {
        Ok(payload) => payload,
        Err(error) => {
            warn!(%error, "Undecodable redirect data, substituting failure payload");
            AuthCallbackPayload::decode_failure()
        }
    }
}

/// Extract a payload from a custom URI scheme activation.
///
/// Returns `None` when the URL is not an auth callback for the given scheme
/// (so callers can log and drop unrelated activation arguments). A matching
/// URL always yields a payload, malformed data included.
pub fn payload_from_deep_link(raw_url: &str, scheme: &str) -> Option<AuthCallbackPayload> {
    let url = match Url::parse(raw_url) {
        Ok(url) => url,
        Err(error) => {
            debug!(%error, raw_url, "Activation argument is not a URL");
            return None;
        }
    };

    if url.scheme() != scheme
        || url.host_str() != Some(DEEP_LINK_HOST)
        || url.path() != DEEP_LINK_PATH
    {
        return None;
    }

    Some(payload_from_url(&url))
}

/// Extract a payload from an intercepted navigation inside a privileged
/// embedded window.
///
/// Any navigation whose URL starts with the configured success prefix is
/// treated as the flow result; everything else returns `None` and the
/// navigation proceeds untouched.
pub fn payload_from_navigation(raw_url: &str, success_prefix: &str) -> Option<AuthCallbackPayload> {
    if !raw_url.starts_with(success_prefix) {
        return None;
    }

    match Url::parse(raw_url) {
        Ok(url) => Some(payload_from_url(&url)),
        Err(error) => {
            warn!(%error, raw_url, "Success navigation URL failed to parse");
            Some(AuthCallbackPayload::decode_failure())
        }
    }
}

fn payload_from_url(url: &Url) -> AuthCallbackPayload {
    let data = url
        .query_pairs()
        .find(|(key, _)| key == DATA_PARAM)
        .map(|(_, value)| value.into_owned());

    match data {
        Some(raw) => decode_redirect_data(&raw),
        None => {
            warn!(url = %url, "Auth callback URL is missing the data parameter");
            AuthCallbackPayload::decode_failure()
        }
    }
}

/// Percent-decode a string, tolerating malformed escapes.
fn percent_decode(s: &str) -> String {
    let mut result = Vec::new();
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '%' {
            let hex: String = chars.by_ref().take(2).collect();
            if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                result.push(byte);
            }
        } else if c == '+' {
            result.push(b' ');
        } else {
            let mut buf = [0u8; 4];
            result.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
    }

    String::from_utf8_lossy(&result).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::DECODE_FAILURE_MESSAGE;

    const SCHEME: &str = "tweakbench";
    const SUCCESS_PREFIX: &str = "https://api.tweakbench.app/auth/success";

    fn encoded(json: &str) -> String {
        let mut out = String::new();
        for byte in json.as_bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    out.push(*byte as char)
                }
                _ => out.push_str(&format!("%{:02X}", byte)),
            }
        }
        out
    }

    #[test]
    fn test_decode_plain_json() {
        let payload = decode_redirect_data(r#"{"success":true,"message":"ok","token":"t"}"#);
        assert!(payload.is_accepted());
    }

    #[test]
    fn test_decode_percent_encoded_json() {
        let raw = encoded(r#"{"success":true,"message":"ok","token":"t"}"#);
        let payload = decode_redirect_data(&raw);
        assert!(payload.is_accepted());
        assert_eq!(payload.token.as_deref(), Some("t"));
    }

    #[test]
    fn test_decode_garbage_yields_failure_payload() {
        let payload = decode_redirect_data("not json at all %%%");
        assert!(!payload.success);
        assert_eq!(payload.message, DECODE_FAILURE_MESSAGE);
    }

    #[test]
    fn test_deep_link_extraction() {
        let data = encoded(r#"{"success":true,"message":"ok","token":"tok"}"#);
        let url = format!("tweakbench://auth/callback?data={}", data);
        let payload = payload_from_deep_link(&url, SCHEME).unwrap();
        assert!(payload.is_accepted());
    }

    #[test]
    fn test_deep_link_wrong_scheme_ignored() {
        assert!(payload_from_deep_link("otherapp://auth/callback?data=x", SCHEME).is_none());
    }

    #[test]
    fn test_deep_link_unrelated_path_ignored() {
        assert!(payload_from_deep_link("tweakbench://settings/open", SCHEME).is_none());
    }

    #[test]
    fn test_deep_link_not_a_url_ignored() {
        assert!(payload_from_deep_link("--flag-from-os", SCHEME).is_none());
    }

    #[test]
    fn test_deep_link_missing_data_is_failure_payload() {
        let payload = payload_from_deep_link("tweakbench://auth/callback", SCHEME).unwrap();
        assert_eq!(payload.message, DECODE_FAILURE_MESSAGE);
    }

    #[test]
    fn test_navigation_extraction() {
        let data = encoded(r#"{"success":false,"message":"Provider rejected login"}"#);
        let url = format!("{}?data={}", SUCCESS_PREFIX, data);
        let payload = payload_from_navigation(&url, SUCCESS_PREFIX).unwrap();
        assert!(!payload.success);
        assert_eq!(payload.message, "Provider rejected login");
    }

    #[test]
    fn test_navigation_other_urls_pass_through() {
        assert!(
            payload_from_navigation("https://accounts.google.com/consent", SUCCESS_PREFIX)
                .is_none()
        );
    }

    #[test]
    fn test_both_transports_agree() {
        let data = encoded(r#"{"success":true,"message":"ok","token":"same"}"#);
        let deep = payload_from_deep_link(
            &format!("tweakbench://auth/callback?data={}", data),
            SCHEME,
        )
        .unwrap();
        let nav =
            payload_from_navigation(&format!("{}?data={}", SUCCESS_PREFIX, data), SUCCESS_PREFIX)
                .unwrap();
        assert_eq!(deep, nav);
    }

    #[test]
    fn test_percent_decode_plus_as_space() {
        assert_eq!(percent_decode("hello+world"), "hello world");
    }
}
