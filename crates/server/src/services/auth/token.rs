//! Access token inspection.
//!
//! Tokens are issued by the hosted auth service. The payload is read locally
//! so expired or garbage tokens are turned away before any network call.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::AuthError;

/// Audience the hosted auth service stamps on user tokens.
pub const TOKEN_AUDIENCE: &str = "authenticated";

/// The claims this server reads from an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
}

/// Decode the payload segment without checking the signature.
///
/// # Errors
///
/// Returns `AuthError::Malformed` if the token is not three dot-separated
/// segments with a base64url JSON payload carrying `sub` and `exp`.
pub fn peek_claims(token: &str) -> Result<TokenClaims, AuthError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::Malformed);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| AuthError::Malformed)?;
    let claims: TokenClaims = serde_json::from_slice(&bytes).map_err(|_| AuthError::Malformed)?;

    if claims.sub.is_empty() {
        return Err(AuthError::Malformed);
    }
    Ok(claims)
}

/// Reject claims whose `exp` is not after `now` (seconds since epoch).
///
/// # Errors
///
/// Returns `AuthError::Expired`.
pub fn check_expiry(claims: &TokenClaims, now: i64) -> Result<(), AuthError> {
    if claims.exp <= now {
        return Err(AuthError::Expired);
    }
    Ok(())
}

/// Verify an HS256 token against the platform's signing secret.
///
/// # Errors
///
/// Returns `AuthError::Expired` for an expired token and
/// `AuthError::Rejected` for any signature or audience failure.
pub fn verify_hs256(token: &str, secret: &SecretString) -> Result<TokenClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[TOKEN_AUDIENCE]);

    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        kind => {
            tracing::debug!(error = ?kind, "Token signature check failed");
            AuthError::Rejected
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;

    const SECRET: &str = "kX9#mQ2$vL7!pR4@wN8%zT1^bH6&cJ3*";

    #[derive(Serialize)]
    struct Minted<'a> {
        sub: &'a str,
        email: &'a str,
        exp: i64,
        aud: &'a str,
    }

    fn mint(exp: i64, aud: &str, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &Minted {
                sub: "6f9619ff-8b86-d011-b42d-00c04fc964ff",
                email: "mei@example.com",
                exp,
                aud,
            },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    #[test]
    fn test_peek_claims_reads_payload() {
        let token = mint(now() + 600, TOKEN_AUDIENCE, "whatever");
        let claims = peek_claims(&token).unwrap();
        assert_eq!(claims.sub, "6f9619ff-8b86-d011-b42d-00c04fc964ff");
        assert_eq!(claims.email.as_deref(), Some("mei@example.com"));
    }

    #[test]
    fn test_peek_claims_rejects_garbage() {
        for token in ["", "abc", "a.b", "a.b.c.d", "a.!!!.c", "a.e30.c"] {
            assert!(
                matches!(peek_claims(token), Err(AuthError::Malformed)),
                "accepted {token:?}"
            );
        }
    }

    #[test]
    fn test_check_expiry() {
        let claims = TokenClaims {
            sub: "x".into(),
            email: None,
            exp: 100,
        };
        assert!(matches!(check_expiry(&claims, 100), Err(AuthError::Expired)));
        assert!(check_expiry(&claims, 99).is_ok());
    }

    #[test]
    fn test_verify_hs256() {
        let secret = SecretString::from(SECRET);

        let good = mint(now() + 600, TOKEN_AUDIENCE, SECRET);
        assert!(verify_hs256(&good, &secret).unwrap().exp > now());

        let wrong_key = mint(now() + 600, TOKEN_AUDIENCE, "another-secret-entirely-0123456789");
        assert!(matches!(verify_hs256(&wrong_key, &secret), Err(AuthError::Rejected)));

        let wrong_aud = mint(now() + 600, "anon", SECRET);
        assert!(matches!(verify_hs256(&wrong_aud, &secret), Err(AuthError::Rejected)));

        let expired = mint(now() - 3600, TOKEN_AUDIENCE, SECRET);
        assert!(matches!(verify_hs256(&expired, &secret), Err(AuthError::Expired)));
    }
}
