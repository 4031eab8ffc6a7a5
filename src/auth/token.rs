use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;

use crate::helpers::time::{expires_at, now_utc, TOKEN_EXPIRY_DELTA_SECONDS};

pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Bearer token as handed to the transport
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    /// None means the upstream did not report an expiry
    pub expires_at: Option<DateTime<Utc>>,
}

impl Token {
    pub fn new(access_token: String, refresh_token: Option<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            access_token,
            token_type: TOKEN_TYPE_BEARER.to_owned(),
            refresh_token,
            expires_at,
        }
    }

    /// Usable for at least another expiry delta
    pub fn is_valid(&self) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        self.expires_at
            .map(|exp| now_utc() + ChronoDuration::seconds(TOKEN_EXPIRY_DELTA_SECONDS) < exp)
            .unwrap_or(true)
    }

    /// `Authorization` header value
    pub fn authorization(&self) -> String {
        let token_type = if self.token_type.is_empty() || self.token_type.eq_ignore_ascii_case(TOKEN_TYPE_BEARER) {
            TOKEN_TYPE_BEARER
        } else {
            self.token_type.as_str()
        };
        format!("{} {}", token_type, self.access_token)
    }
}

/// Token endpoint response body
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    pub fn into_token(self) -> Token {
        Token {
            access_token: self.access_token,
            token_type: self.token_type.unwrap_or_else(|| TOKEN_TYPE_BEARER.to_owned()),
            refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
            expires_at: self.expires_in.filter(|s| *s > 0).and_then(expires_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_never_valid() {
        assert!(!Token::default().is_valid());
    }

    #[test]
    fn token_inside_expiry_delta_is_invalid() {
        let almost = Token::new("a".into(), None, Some(now_utc() + ChronoDuration::seconds(5)));
        assert!(!almost.is_valid());

        let fresh = Token::new("a".into(), None, Some(now_utc() + ChronoDuration::seconds(600)));
        assert!(fresh.is_valid());

        let unbounded = Token::new("a".into(), None, None);
        assert!(unbounded.is_valid());
    }

    #[test]
    fn authorization_header_normalizes_bearer_case() {
        let token = TokenResponse {
            access_token: "abc".into(),
            token_type: Some("bearer".into()),
            refresh_token: Some(String::new()),
            expires_in: Some(3600),
        }
        .into_token();

        assert_eq!(token.authorization(), "Bearer abc");
        assert_eq!(token.refresh_token, None);
        assert!(token.is_valid());
    }

    #[test]
    fn out_of_range_expiry_is_treated_as_unbounded() {
        for expires_in in [i64::MAX, 1_000_000_000_000_000] {
            let token = TokenResponse {
                access_token: "abc".into(),
                token_type: None,
                refresh_token: None,
                expires_in: Some(expires_in),
            }
            .into_token();

            assert_eq!(token.expires_at, None);
            assert!(token.is_valid());
        }
    }
}
