use axum::{
    extract::FromRequestParts,
    http::{Method, Request, Uri, header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use taskboard::{
    auth::{ADMIN_ONLY, ANY_AUTHENTICATED, Identity},
    config::AppConfig,
    error::ApiError,
    models::Role,
    token::{Claims, TokenCodec},
};
use uuid::Uuid;

const TEST_USER_ID: Uuid = Uuid::from_u128(7);

// The Identity extractor only needs AppConfig from the state, so the test
// state is the config itself (axum's blanket FromRef for Clone covers it).
fn test_config() -> AppConfig {
    AppConfig::default()
}

fn valid_token(config: &AppConfig, role: Role) -> String {
    TokenCodec::from_config(config)
        .issue(TEST_USER_ID, "gate@example.com", role)
        .unwrap()
}

fn expired_token(config: &AppConfig) -> String {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: TEST_USER_ID,
        email: "gate@example.com".to_string(),
        role: Role::User,
        iat: now - 7200,
        exp: now - 3600,
    };
    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn request_parts(auth_header: Option<&str>) -> Parts {
    let mut builder = Request::builder()
        .method(Method::GET)
        .uri("/".parse::<Uri>().unwrap());
    if let Some(value) = auth_header {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let (parts, _) = builder.body(axum::body::Body::empty()).unwrap().into_parts();
    parts
}

#[tokio::test]
async fn missing_header_is_rejected() {
    let config = test_config();
    let mut parts = request_parts(None);

    let err = Identity::from_request_parts(&mut parts, &config)
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::MissingCredential);
}

#[tokio::test]
async fn non_bearer_scheme_is_malformed() {
    let config = test_config();
    let mut parts = request_parts(Some("Token abcdef"));

    let err = Identity::from_request_parts(&mut parts, &config)
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::MalformedCredential);
}

#[tokio::test]
async fn bearer_with_empty_token_is_malformed() {
    let config = test_config();
    let mut parts = request_parts(Some("Bearer "));

    let err = Identity::from_request_parts(&mut parts, &config)
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::MalformedCredential);
}

#[tokio::test]
async fn expired_token_is_distinguished_from_invalid() {
    let config = test_config();
    let token = expired_token(&config);
    let mut parts = request_parts(Some(&format!("Bearer {token}")));

    let err = Identity::from_request_parts(&mut parts, &config)
        .await
        .unwrap_err();
    // Same 401 on the wire, but internally this must be the expiry variant.
    assert_eq!(err, ApiError::ExpiredCredential);
}

#[tokio::test]
async fn tampered_token_is_invalid() {
    let config = test_config();
    let token = TokenCodec::new("some-other-secret", 3600)
        .issue(TEST_USER_ID, "gate@example.com", Role::Admin)
        .unwrap();
    let mut parts = request_parts(Some(&format!("Bearer {token}")));

    let err = Identity::from_request_parts(&mut parts, &config)
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::InvalidCredential);
}

#[tokio::test]
async fn valid_token_yields_identity_from_claims() {
    let config = test_config();
    let token = valid_token(&config, Role::Admin);
    let mut parts = request_parts(Some(&format!("Bearer {token}")));

    let identity = Identity::from_request_parts(&mut parts, &config)
        .await
        .unwrap();
    assert_eq!(identity.id, TEST_USER_ID);
    assert_eq!(identity.email, "gate@example.com");
    assert_eq!(identity.role, Role::Admin);
}

#[tokio::test]
async fn role_gate_allows_empty_requirement_and_enforces_membership() {
    let config = test_config();
    let token = valid_token(&config, Role::User);
    let mut parts = request_parts(Some(&format!("Bearer {token}")));
    let identity = Identity::from_request_parts(&mut parts, &config)
        .await
        .unwrap();

    // Empty required set: any authenticated identity passes.
    assert!(ANY_AUTHENTICATED.authorize(&identity).is_ok());
    // Non-member role is denied.
    assert_eq!(
        ADMIN_ONLY.authorize(&identity).unwrap_err(),
        ApiError::InsufficientRole
    );
}
