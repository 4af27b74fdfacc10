use super::*;
use crate::state::test_helpers::env_lock;

const SECRET: &[u8] = b"test-secret-for-token-codec-at-least-32-bytes";

fn t0() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
}

fn codec() -> TokenCodec {
    TokenCodec::new(SECRET)
}

/// Replace the signature character at `idx` with a different base64url char.
fn tamper_signature(token: &str, idx: usize) -> String {
    let (signed, sig) = token.rsplit_once('.').unwrap();
    let mut bytes = sig.as_bytes().to_vec();
    bytes[idx] = if bytes[idx] == b'A' { b'B' } else { b'A' };
    format!("{signed}.{}", String::from_utf8(bytes).unwrap())
}

// =============================================================================
// issue / verify
// =============================================================================

#[test]
fn verify_returns_issued_claims() {
    let codec = codec();
    let token = codec.issue_at(42, t0()).unwrap();
    let claims = codec.verify_at(&token, t0() + Duration::hours(1)).unwrap();
    assert_eq!(claims.id, 42);
    assert_eq!(claims.iat, t0().unix_timestamp());
}

#[test]
fn expiry_is_six_hours_after_issue() {
    let codec = codec();
    let token = codec.issue_at(7, t0()).unwrap();
    let claims = codec.verify_at(&token, t0()).unwrap();
    assert_eq!(claims.exp - claims.iat, 6 * 60 * 60);
}

#[test]
fn issue_is_deterministic_for_same_clock() {
    let codec = codec();
    assert_eq!(codec.issue_at(1, t0()).unwrap(), codec.issue_at(1, t0()).unwrap());
    assert_ne!(codec.issue_at(1, t0()).unwrap(), codec.issue_at(1, t0() + Duration::seconds(1)).unwrap());
}

#[test]
fn issue_with_system_clock_verifies_now() {
    let codec = codec();
    let token = codec.issue(99).unwrap();
    assert_eq!(codec.verify(&token).unwrap().id, 99);
}

#[test]
fn still_valid_at_exact_expiry() {
    let codec = codec();
    let token = codec.issue_at(3, t0()).unwrap();
    assert!(codec.verify_at(&token, t0() + TOKEN_TTL).is_ok());
}

#[test]
fn expired_token_reports_expired() {
    let codec = codec();
    let token = codec.issue_at(3, t0()).unwrap();
    for later in [Duration::seconds(1), Duration::hours(1), Duration::days(30)] {
        let err = codec.verify_at(&token, t0() + TOKEN_TTL + later).unwrap_err();
        assert!(matches!(err, TokenError::Expired), "got {err:?}");
    }
}

// =============================================================================
// malformed input
// =============================================================================

#[test]
fn any_altered_signature_byte_is_malformed() {
    let codec = codec();
    let token = codec.issue_at(5, t0()).unwrap();
    let sig_len = token.rsplit_once('.').unwrap().1.len();
    // The final char carries padding bits; every other position is pure data.
    for idx in 0..sig_len - 1 {
        let forged = tamper_signature(&token, idx);
        assert_ne!(forged, token);
        let err = codec.verify_at(&forged, t0()).unwrap_err();
        assert!(matches!(err, TokenError::Malformed), "idx {idx}: got {err:?}");
    }
}

#[test]
fn forged_and_expired_is_still_malformed() {
    let codec = codec();
    let token = codec.issue_at(5, t0()).unwrap();
    let forged = tamper_signature(&token, 10);
    let err = codec.verify_at(&forged, t0() + Duration::days(1)).unwrap_err();
    assert!(matches!(err, TokenError::Malformed));
}

#[test]
fn wrong_secret_is_malformed() {
    let token = codec().issue_at(5, t0()).unwrap();
    let other = TokenCodec::new(b"a-completely-different-secret-value-here");
    assert!(matches!(other.verify_at(&token, t0()), Err(TokenError::Malformed)));
}

#[test]
fn garbage_is_malformed() {
    let codec = codec();
    for input in ["", "not-a-token", "a.b.c", "...."] {
        assert!(matches!(codec.verify_at(input, t0()), Err(TokenError::Malformed)), "input {input:?}");
    }
}

#[test]
fn other_algorithm_is_malformed() {
    let claims = Claims { id: 1, iat: t0().unix_timestamp(), exp: (t0() + TOKEN_TTL).unix_timestamp() };
    let token = jsonwebtoken::encode(&Header::new(Algorithm::HS512), &claims, &EncodingKey::from_secret(SECRET)).unwrap();
    assert!(matches!(codec().verify_at(&token, t0()), Err(TokenError::Malformed)));
}

// =============================================================================
// from_env
// =============================================================================

#[test]
fn from_env_blank_secret_is_missing() {
    let _env = env_lock();
    unsafe { std::env::set_var(SECRET_VAR, "   ") };
    let result = TokenCodec::from_env();
    unsafe { std::env::remove_var(SECRET_VAR) };
    assert!(matches!(result, Err(TokenError::MissingSecret { .. })));
}
