//! JWT algorithms based on HMACs.

use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

use super::HashAlg;

macro_rules! compute_hmac {
    ($digest:ty, $key:expr, $message:expr) => {{
        let mut hmac =
            <Hmac<$digest> as Mac>::new_from_slice($key).expect("HMACs work with any key size");
        hmac.update($message);
        hmac.finalize().into_bytes().to_vec()
    }};
}

/// Computes HMAC with the specified `key` and `message`.
pub(super) fn sign(hash: HashAlg, key: &[u8], message: &[u8]) -> Vec<u8> {
    match hash {
        HashAlg::Sha256 => compute_hmac!(Sha256, key, message),
        HashAlg::Sha384 => compute_hmac!(Sha384, key, message),
        HashAlg::Sha512 => compute_hmac!(Sha512, key, message),
    }
}

/// Recomputes HMAC and compares it with `signature` in constant time. Signatures
/// with an unexpected length never match.
pub(super) fn verify(hash: HashAlg, key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let expected = sign(hash, key, message);
    expected.as_slice().ct_eq(signature).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    use base64ct::{Base64UrlUnpadded, Encoding};

    #[test]
    fn hmac_output_sizes() {
        for hash in [HashAlg::Sha256, HashAlg::Sha384, HashAlg::Sha512] {
            let tag = sign(hash, b"key", b"message");
            assert_eq!(tag.len(), hash.output_size());
            assert!(verify(hash, b"key", b"message", &tag));
            assert!(!verify(hash, b"other key", b"message", &tag));
            assert!(!verify(hash, b"key", b"message", &tag[1..]));
        }
    }

    #[test]
    fn hs256_reference_signature() {
        //! Example from https://tools.ietf.org/html/rfc7515#appendix-A.1

        const SIGNED_DATA: &str = "eyJ0eXAiOiJKV1QiLA0KICJhbGciOiJIUzI1NiJ9.\
             eyJpc3MiOiJqb2UiLA0KICJleHAiOjEzMDA4MTkzODAsDQogImh0dHA6Ly9leGFt\
             cGxlLmNvbS9pc19yb290Ijp0cnVlfQ";
        const KEY: &str = "AyM1SysPpbyDfgZld3umj1qzKObwVMkoqQ-EstJQLr_T-1qS0gZH75\
                           aKtMN3Yj0iPS4hcgUuTwjAzZr1Z9CAow";
        const SIGNATURE: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";

        let key = Base64UrlUnpadded::decode_vec(KEY).unwrap();
        let signature = sign(HashAlg::Sha256, &key, SIGNED_DATA.as_bytes());
        assert_eq!(Base64UrlUnpadded::encode_string(&signature), SIGNATURE);
    }
}
