//! Basic-auth credential parsing for GET /connect.

use base64::{engine::general_purpose::STANDARD, Engine};

/// Email/password pair from an `Authorization: Basic` header.
#[derive(Debug, PartialEq, Eq)]
pub struct BasicCredentials {
    pub email: String,
    pub password: String,
}

/// Parse `Basic <base64(email:password)>`. Returns `None` for anything
/// malformed; the caller maps that to a uniform 401.
pub fn parse_basic_auth(header_value: &str) -> Option<BasicCredentials> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    // Passwords may contain ':', so split on the first one only.
    let (email, password) = decoded.split_once(':')?;
    if email.is_empty() {
        return None;
    }

    Some(BasicCredentials {
        email: email.to_string(),
        password: password.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(raw: &str) -> String {
        format!("Basic {}", STANDARD.encode(raw))
    }

    #[test]
    fn parses_email_and_password() {
        let creds = parse_basic_auth(&encode("bob@dylan.com:toto1234!")).unwrap();
        assert_eq!(creds.email, "bob@dylan.com");
        assert_eq!(creds.password, "toto1234!");
    }

    #[test]
    fn password_may_contain_colons() {
        let creds = parse_basic_auth(&encode("bob@dylan.com:pa:ss:wd")).unwrap();
        assert_eq!(creds.password, "pa:ss:wd");
    }

    #[test]
    fn rejects_missing_scheme() {
        assert!(parse_basic_auth("Bearer abc").is_none());
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(parse_basic_auth("Basic not-base64!!!").is_none());
    }

    #[test]
    fn rejects_missing_separator() {
        assert!(parse_basic_auth(&encode("bobdylan.com")).is_none());
    }

    #[test]
    fn rejects_empty_email() {
        assert!(parse_basic_auth(&encode(":password")).is_none());
    }
}
