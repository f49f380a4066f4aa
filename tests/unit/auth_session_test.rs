//! Unit tests for decoding the auth provider's access token.

use astrolab::types::errors::AuthError;
use astrolab::types::session::AuthSession;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rstest::rstest;

fn token_with_payload(payload: &str) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload)
    )
}

#[test]
fn test_subject_becomes_user_id() {
    let token = token_with_payload(r#"{"sub":"5f0c-user","role":"authenticated"}"#);
    let session = AuthSession::from_access_token(&token).unwrap();
    assert!(session.is_authenticated());
    assert_eq!(session.user_id(), Some("5f0c-user"));
    assert_eq!(session.access_token(), Some(token.as_str()));
}

#[test]
fn test_surrounding_whitespace_is_ignored() {
    let token = token_with_payload(r#"{"sub":"u"}"#);
    let session = AuthSession::from_access_token(&format!("  {}\n", token)).unwrap();
    assert_eq!(session.access_token(), Some(token.as_str()));
}

#[test]
fn test_default_is_signed_out() {
    let session = AuthSession::default();
    assert!(!session.is_authenticated());
    assert_eq!(session.user_id(), None);
    assert_eq!(session.access_token(), None);
}

#[rstest]
#[case::two_segments("abc.def")]
#[case::four_segments("a.b.c.d")]
#[case::not_base64("header.***.sig")]
#[case::empty("")]
fn test_malformed_tokens_rejected(#[case] token: &str) {
    assert!(matches!(
        AuthSession::from_access_token(token),
        Err(AuthError::InvalidToken(_))
    ));
}

#[rstest]
#[case::no_subject(r#"{"role":"anon"}"#)]
#[case::blank_subject(r#"{"sub":"  "}"#)]
#[case::not_json("plain text")]
fn test_payload_without_usable_subject_rejected(#[case] payload: &str) {
    let token = token_with_payload(payload);
    assert!(matches!(
        AuthSession::from_access_token(&token),
        Err(AuthError::InvalidToken(_))
    ));
}
