use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Default headers for every control-plane request.
///
/// The control plane authenticates with `Authorization: Bearer <key>`.
/// The header value is marked sensitive so it never shows up in
/// `Debug` output or request logs.
pub fn bearer_headers(api_key: &SecretString) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let mut value = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
        .map_err(|e| Error::InvalidApiKey {
            message: format!("invalid header value: {e}"),
        })?;
    value.set_sensitive(true);
    headers.insert(AUTHORIZATION, value);

    Ok(headers)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_is_sensitive() {
        let key = SecretString::from("dev-key".to_string());
        let headers = bearer_headers(&key).unwrap();
        let auth = headers.get(AUTHORIZATION).unwrap();
        assert!(auth.is_sensitive());
        assert_eq!(auth.to_str().unwrap(), "Bearer dev-key");
    }

    #[test]
    fn newline_in_key_is_rejected() {
        let key = SecretString::from("bad\nkey".to_string());
        assert!(matches!(
            bearer_headers(&key),
            Err(Error::InvalidApiKey { .. })
        ));
    }
}
