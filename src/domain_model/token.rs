use super::SubjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Access => f.write_str("access"),
            TokenType::Refresh => f.write_str("refresh"),
        }
    }
}

/// Decoded, verified contents of a token.
///
/// Tokens are never mutated after issuance. Revocation lives in the
/// blacklist, keyed by `jti`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TokenClaims {
    pub subject_id: SubjectId,
    pub token_type: TokenType,
    pub jti: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TokenClaims {
    /// Whole seconds of validity left at `now`, rounded up so a blacklist
    /// entry never expires before the token does. Zero once expired.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        let secs = self.expires_at.timestamp() - now.timestamp();
        if secs <= 0 { 0 } else { secs as u64 }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub encoded: String,
    pub claims: TokenClaims,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn claims_expiring_at(exp: i64) -> TokenClaims {
        TokenClaims {
            subject_id: SubjectId::new_random(),
            token_type: TokenType::Refresh,
            jti: "jti".to_string(),
            issued_at: Utc.timestamp_opt(exp - 60, 0).unwrap(),
            expires_at: Utc.timestamp_opt(exp, 0).unwrap(),
        }
    }

    #[test]
    fn remaining_secs_counts_down_to_zero() {
        let claims = claims_expiring_at(1_000);
        let now = Utc.timestamp_opt(990, 0).unwrap();
        assert_eq!(claims.remaining_secs(now), 10);
        assert_eq!(claims.remaining_secs(now + Duration::seconds(10)), 0);
        assert_eq!(claims.remaining_secs(now + Duration::seconds(30)), 0);
    }

    #[test]
    fn token_type_serializes_lowercase() {
        let json = serde_json::to_string(&TokenType::Refresh).unwrap();
        assert_eq!(json, "\"refresh\"");
        assert_eq!(TokenType::Access.to_string(), "access");
    }
}
