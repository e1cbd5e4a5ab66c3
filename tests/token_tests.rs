use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use taskboard::config::DEFAULT_TOKEN_TTL_SECS;
use taskboard::models::Role;
use taskboard::token::{Claims, TokenCodec, TokenError};
use uuid::Uuid;

const TEST_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: Uuid = Uuid::from_u128(1);

fn codec() -> TokenCodec {
    TokenCodec::new(TEST_SECRET, 3600)
}

/// Signs arbitrary claims outside the codec, to fabricate expired or
/// wrong-secret tokens.
fn sign_raw(claims: &Claims, secret: &str) -> String {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &key).unwrap()
}

#[test]
fn round_trip_preserves_identity_claims() {
    let token = codec()
        .issue(TEST_USER_ID, "admin@example.com", Role::Admin)
        .unwrap();

    let claims = codec().verify(&token).unwrap();
    assert_eq!(claims.sub, TEST_USER_ID);
    assert_eq!(claims.email, "admin@example.com");
    assert_eq!(claims.role, Role::Admin);
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[test]
fn default_ttl_is_seven_days() {
    let codec = TokenCodec::new(TEST_SECRET, DEFAULT_TOKEN_TTL_SECS);
    let token = codec.issue(TEST_USER_ID, "u@example.com", Role::User).unwrap();

    let claims = codec.verify(&token).unwrap();
    assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
}

#[test]
fn expired_token_fails_even_with_valid_signature() {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: TEST_USER_ID,
        email: "u@example.com".to_string(),
        role: Role::User,
        iat: now - 7200,
        exp: now - 3600,
    };
    // Correct secret: the signature check alone would pass.
    let token = sign_raw(&claims, TEST_SECRET);

    assert_eq!(codec().verify(&token), Err(TokenError::Expired));
}

#[test]
fn wrong_secret_fails_as_invalid_signature() {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: TEST_USER_ID,
        email: "u@example.com".to_string(),
        role: Role::Admin,
        iat: now,
        exp: now + 3600,
    };
    let token = sign_raw(&claims, "a-completely-different-secret");

    assert_eq!(codec().verify(&token), Err(TokenError::InvalidSignature));
}

#[test]
fn garbage_input_fails_as_malformed() {
    assert_eq!(codec().verify("not-a-token"), Err(TokenError::Malformed));
    assert_eq!(codec().verify(""), Err(TokenError::Malformed));
}
