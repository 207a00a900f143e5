//! Functionality shared by `algorithms` and `rsa` tests.

#![allow(dead_code)]

use assert_matches::assert_matches;
use jwt_engine::{
    encoding::{base64url_decode, base64url_encode},
    prelude::*,
    Error, SignatureError,
};
use rand::{seq::index::sample as sample_indexes, thread_rng};
use serde_json::json;

/// 2100-01-01T00:00:00Z
pub const FAR_FUTURE: i64 = 4_102_444_800;

pub fn create_claims() -> Claims {
    Claims::empty()
        .with("sub", "1234567890")
        .with("name", "John Doe")
        .with("admin", true)
        .with("scopes", json!(["read", "write"]))
        .with("iat", 1_598_954_400)
        .with("exp", FAR_FUTURE)
}

fn replace_segment(token: &str, index: usize, segment: &str) -> String {
    let mut segments: Vec<_> = token.split('.').collect();
    segments[index] = segment;
    segments.join(".")
}

/// Checks the round trip for `engine`, and that the signature detects tampering
/// with any part of the token.
pub async fn test_algorithm(engine: &JwtEngine) {
    // Maximum number of signature bits mangled.
    const MAX_MANGLED_BITS: usize = 128;

    let claims = create_claims();

    // Successful case.
    let token_string = engine.sign(claims.clone()).await.unwrap();
    let verified = engine.verify(&token_string).await.unwrap();
    assert_eq!(verified, claims);

    // Mutate signature bits.
    let signature = token_string.rsplit('.').next().unwrap();
    let signature = base64url_decode(signature).unwrap();
    let signature_bits = signature.len() * 8;

    let mangled_bits: Box<dyn Iterator<Item = usize>> = if signature_bits <= MAX_MANGLED_BITS {
        Box::new(0..signature_bits)
    } else {
        let indexes = sample_indexes(&mut thread_rng(), signature_bits, MAX_MANGLED_BITS);
        Box::new(indexes.into_iter())
    };

    for i in mangled_bits {
        let mut mangled_signature = signature.clone();
        mangled_signature[i / 8] ^= 1 << (i % 8) as u8;
        let mangled_str =
            replace_segment(&token_string, 2, &base64url_encode(&mangled_signature));
        let err = engine.verify(&mangled_str).await.unwrap_err();
        match err {
            Error::Signature(
                SignatureError::InvalidSignature | SignatureError::MalformedSignature(_),
            ) => {}
            err => panic!("Unexpected error: {err:?}"),
        }
    }

    // Mutate bits of the encoded signature text. Only the lower 7 bits are flipped,
    // so the token remains ASCII.
    let encoded_signature = token_string.rsplit('.').next().unwrap();
    let text_bits = encoded_signature.len() * 7;
    let indexes = sample_indexes(&mut thread_rng(), text_bits, MAX_MANGLED_BITS.min(text_bits));
    for i in indexes {
        let mut mangled_signature = encoded_signature.as_bytes().to_vec();
        mangled_signature[i / 7] ^= 1 << (i % 7) as u8;
        let mangled_signature = String::from_utf8(mangled_signature).unwrap();
        if mangled_signature.contains('.') {
            continue; // changes the token structure rather than the signature
        }
        if base64url_decode(&mangled_signature).ok().as_ref() == Some(&signature) {
            continue; // only the unused trailing bits have changed
        }

        let mangled_str = replace_segment(&token_string, 2, &mangled_signature);
        let err = engine.verify(&mangled_str).await.unwrap_err();
        match err {
            Error::Signature(
                SignatureError::InvalidSignature | SignatureError::MalformedSignature(_),
            ) => {}
            err => panic!("Unexpected error for signature {mangled_signature:?}: {err:?}"),
        }
    }

    // Mutate header: the same fields in another order.
    let algorithm = engine.configuration().algorithm();
    let mangled_header = format!(r#"{{"typ":"JWT","alg":"{algorithm}"}}"#);
    let mangled_header = base64url_encode(mangled_header);
    let mangled_str = replace_segment(&token_string, 0, &mangled_header);
    assert_ne!(mangled_str, token_string);
    let err = engine.verify(&mangled_str).await.unwrap_err();
    assert_matches!(err, Error::Signature(SignatureError::InvalidSignature));

    // Mutate claims.
    let mangled_claims = claims.with("iat", 1_598_954_401);
    let mangled_claims = base64url_encode(serde_json::to_vec(&mangled_claims).unwrap());
    let mangled_str = replace_segment(&token_string, 1, &mangled_claims);
    assert_ne!(mangled_str, token_string);
    let err = engine.verify(&mangled_str).await.unwrap_err();
    assert_matches!(err, Error::Signature(SignatureError::InvalidSignature));
}
