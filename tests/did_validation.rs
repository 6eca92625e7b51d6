use repodump::{Did, StatusCode};
use repodump_error::{ErrorExt, IdentityError};
use rstest::rstest;

#[rstest]
#[case("did:plc:ewvi7nxzyoun6zhxrhs64oiz", "plc")]
#[case("did:web:example.com", "web")]
#[case("did:web:localhost%3A8080", "web")]
#[case("did:key:zQ3shokFTS3brHcDQrn82RUDfCZESWL1ZdCEJwekUDPQiYBme", "key")]
#[case("did:example:a:b:c", "example")]
#[case("did:x:under_score-dash.dot", "x")]
fn test_valid_identities(
    #[case] input: &str,
    #[case] method: &str,
) {
    let did = Did::parse(input).unwrap();
    assert_eq!(did.as_str(), input);
    assert_eq!(did.method(), method);
    assert_eq!(did.to_string(), input);
}

#[rstest]
#[case("", "empty")]
#[case("plc:abc", "prefix")]
#[case("DID:plc:abc", "prefix")]
#[case("did:", "identifier")]
#[case("did:plc", "identifier")]
#[case("did:plc:", "identifier")]
#[case("did::abc", "method")]
#[case("did:PLC:abc", "method")]
#[case("did:pl4:abc", "method")]
#[case("did:plc:abc:", "identifier")]
#[case("did:plc:abc%", "identifier")]
#[case("did:plc:a b", "identifier")]
#[case("did:plc:a/b", "identifier")]
#[case("did:plc:ключ", "identifier")]
fn test_invalid_identities(
    #[case] input: &str,
    #[case] expected: &str,
) {
    let err = Did::parse(input).unwrap_err();
    assert_eq!(err.status_code(), StatusCode::InvalidIdentity);
    let kind = match err {
        IdentityError::Empty => "empty",
        IdentityError::MissingPrefix { .. } => "prefix",
        IdentityError::InvalidMethod { .. } => "method",
        IdentityError::InvalidIdentifier { .. } => "identifier",
        IdentityError::TooLong { .. } => "length",
    };
    assert_eq!(kind, expected, "{input}");
}

#[rstest]
#[case(2048, true)]
#[case(2049, false)]
fn test_length_limit(
    #[case] len: usize,
    #[case] accepted: bool,
) {
    let input = format!("did:plc:{}", "a".repeat(len - "did:plc:".len()));
    assert_eq!(input.len(), len);
    assert_eq!(Did::parse(&input).is_ok(), accepted);
}
