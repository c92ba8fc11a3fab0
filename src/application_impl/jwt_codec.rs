use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::Clock;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub signing_key: Vec<u8>,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: String,
    #[serde(rename = "type")]
    token_type: TokenType,
    jti: String,
    iat: i64,
    exp: i64,
    iss: String,
    aud: String,
}

pub struct JwtHs256Codec {
    cfg: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock after the signature.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.set_audience(&[cfg.audience.clone()]);
        validation.set_issuer(&[cfg.issuer.clone()]);

        JwtHs256Codec {
            encoding_key: EncodingKey::from_secret(&cfg.signing_key),
            decoding_key: DecodingKey::from_secret(&cfg.signing_key),
            validation,
            cfg,
            clock,
        }
    }

    #[inline]
    fn gen_jti() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    #[inline]
    fn parse_subject_id(sub: &str) -> Result<SubjectId, TokenError> {
        sub.parse::<SubjectId>().map_err(|_| TokenError::Malformed)
    }

    #[inline]
    fn parse_instant(secs: i64) -> Result<DateTime<Utc>, TokenError> {
        DateTime::<Utc>::from_timestamp(secs, 0).ok_or(TokenError::Malformed)
    }
}

impl TokenCodec for JwtHs256Codec {
    fn issue(
        &self,
        subject_id: SubjectId,
        token_type: TokenType,
        lifetime: Duration,
    ) -> Result<IssuedToken, TokenError> {
        let lifetime =
            chrono::Duration::from_std(lifetime).map_err(|e| TokenError::Encode(e.to_string()))?;
        if lifetime <= chrono::Duration::zero() {
            return Err(TokenError::Encode("token lifetime must be positive".to_string()));
        }

        // JWT timestamps have second resolution; truncate once so the
        // returned claims match what a later decode yields.
        let iat = self.clock.now().timestamp();
        let exp = iat + lifetime.num_seconds().max(1);
        let jti = Self::gen_jti();

        let wire = WireClaims {
            sub: subject_id.to_string(),
            token_type,
            jti: jti.clone(),
            iat,
            exp,
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
        };
        let encoded = encode(&Header::new(Algorithm::HS256), &wire, &self.encoding_key)
            .map_err(|e| TokenError::Encode(e.to_string()))?;

        Ok(IssuedToken {
            encoded,
            claims: TokenClaims {
                subject_id,
                token_type,
                jti,
                issued_at: Self::parse_instant(iat)?,
                expires_at: Self::parse_instant(exp)?,
            },
        })
    }

    fn decode_and_verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = decode::<WireClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            },
        )?;
        let wire = data.claims;

        if self.clock.now().timestamp() >= wire.exp {
            return Err(TokenError::Expired);
        }

        let issued_at = Self::parse_instant(wire.iat)?;
        let expires_at = Self::parse_instant(wire.exp)?;
        if expires_at <= issued_at {
            return Err(TokenError::Malformed);
        }

        Ok(TokenClaims {
            subject_id: Self::parse_subject_id(&wire.sub)?,
            token_type: wire.token_type,
            jti: wire.jti,
            issued_at,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::ManualClock;

    fn config(key: &str) -> JwtConfig {
        JwtConfig {
            issuer: "turnstile.test".to_string(),
            audience: "turnstile-client".to_string(),
            signing_key: key.as_bytes().to_vec(),
        }
    }

    fn codec_with_clock() -> (JwtHs256Codec, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (JwtHs256Codec::new(config("unit-test-key"), clock.clone()), clock)
    }

    #[test]
    fn decode_returns_what_was_issued() {
        let (codec, _) = codec_with_clock();
        let subject = SubjectId::new_random();

        for token_type in [TokenType::Access, TokenType::Refresh] {
            let issued = codec
                .issue(subject, token_type, Duration::from_secs(60))
                .unwrap();
            let claims = codec.decode_and_verify(&issued.encoded).unwrap();
            assert_eq!(claims, issued.claims);
            assert_eq!(claims.subject_id, subject);
            assert_eq!(claims.token_type, token_type);
            assert!(claims.expires_at > claims.issued_at);
        }
    }

    #[test]
    fn every_issuance_gets_a_fresh_jti() {
        let (codec, _) = codec_with_clock();
        let subject = SubjectId::new_random();
        let a = codec.issue(subject, TokenType::Refresh, Duration::from_secs(60)).unwrap();
        let b = codec.issue(subject, TokenType::Refresh, Duration::from_secs(60)).unwrap();
        assert_ne!(a.claims.jti, b.claims.jti);
        assert_ne!(a.encoded, b.encoded);
    }

    #[test]
    fn expires_once_clock_passes_exp() {
        let (codec, clock) = codec_with_clock();
        let issued = codec
            .issue(SubjectId::new_random(), TokenType::Access, Duration::from_secs(5))
            .unwrap();

        clock.advance(chrono::Duration::seconds(4));
        assert!(codec.decode_and_verify(&issued.encoded).is_ok());

        clock.advance(chrono::Duration::seconds(2));
        assert_eq!(
            codec.decode_and_verify(&issued.encoded),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn foreign_key_is_rejected_as_bad_signature() {
        let (codec, clock) = codec_with_clock();
        let other = JwtHs256Codec::new(config("some-other-key"), clock);
        let issued = other
            .issue(SubjectId::new_random(), TokenType::Access, Duration::from_secs(60))
            .unwrap();
        assert_eq!(
            codec.decode_and_verify(&issued.encoded),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn signature_is_checked_before_expiry() {
        let (codec, clock) = codec_with_clock();
        let other = JwtHs256Codec::new(config("some-other-key"), clock.clone());
        let issued = other
            .issue(SubjectId::new_random(), TokenType::Access, Duration::from_secs(1))
            .unwrap();
        clock.advance(chrono::Duration::seconds(10));
        assert_eq!(
            codec.decode_and_verify(&issued.encoded),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let (codec, _) = codec_with_clock();
        let issued = codec
            .issue(SubjectId::new_random(), TokenType::Access, Duration::from_secs(60))
            .unwrap();
        let forged = codec
            .issue(SubjectId::new_random(), TokenType::Refresh, Duration::from_secs(60))
            .unwrap();

        // Splice the payload of one token onto the signature of another.
        let mut parts: Vec<&str> = issued.encoded.split('.').collect();
        let forged_payload = forged.encoded.split('.').nth(1).unwrap();
        parts[1] = forged_payload;
        let spliced = parts.join(".");

        assert_eq!(
            codec.decode_and_verify(&spliced),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let (codec, _) = codec_with_clock();
        assert_eq!(codec.decode_and_verify(""), Err(TokenError::Malformed));
        assert_eq!(
            codec.decode_and_verify("not-a-token"),
            Err(TokenError::Malformed)
        );
        assert_eq!(
            codec.decode_and_verify("a.b.c"),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn wrong_audience_is_malformed() {
        let (codec, clock) = codec_with_clock();
        let mut cfg = config("unit-test-key");
        cfg.audience = "someone-else".to_string();
        let other = JwtHs256Codec::new(cfg, clock);
        let issued = other
            .issue(SubjectId::new_random(), TokenType::Access, Duration::from_secs(60))
            .unwrap();
        assert_eq!(
            codec.decode_and_verify(&issued.encoded),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn zero_lifetime_is_refused() {
        let (codec, _) = codec_with_clock();
        let res = codec.issue(SubjectId::new_random(), TokenType::Access, Duration::ZERO);
        assert!(matches!(res, Err(TokenError::Encode(_))));
    }
}
