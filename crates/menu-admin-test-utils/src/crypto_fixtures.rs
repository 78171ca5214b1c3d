//! Fixed RSA keys for signing test tokens.
//!
//! The PEM files under `fixtures/` are 2048-bit test-only keys. Their public
//! moduli are hard-coded so JWKs can be built without parsing the PEM.

use jsonwebtoken::EncodingKey;
use serde_json::{json, Value};

const KEY_01_PEM: &str = include_str!("../fixtures/rsa_key_01.pem");
const KEY_02_PEM: &str = include_str!("../fixtures/rsa_key_02.pem");

/// Modulus of `rsa_key_01.pem` (base64url).
pub const KEY_01_N: &str = "6Zxw_g6IwBSsS5HZTPOgkY-jNnHRw6TWPfmIsTDSGl2nqKj4oX9F2DVxHbXuFhp0-jmlv8_36eJ6XEpyrkr0D9Ho20ar-p6uElIDpHyr_RTJleQZycX0avFirrBp_pLBsMvSObawQr4IrSOXRiTRmOvmfEGJQlT7zWiroKCnD4xJbVQ4ZCIIttT0Dh3w1UelZlum1X8WxsBt-HntCgSAWd0upFoyHN1XI8ChFMRs0ikpFoJlEehXI7hUZhlZoa0sYUBZn9VKJk16NWBtFtcUGEeEllyF5xTXwy2GSEfw-R0-_luNu8cE99QZ_NgaIMDCJEMjJdJiSmwutYrjoKQkiQ";

/// Modulus of `rsa_key_02.pem` (base64url).
pub const KEY_02_N: &str = "t_I4CKNayLWTidoc1b7bemysUlr9ejcWSAC8WUZZhEgJSuec7KmSZSmQctjVLbtSN0xcIMyBPDV9NbfDbtcN_40bwRg9NYOZzaoWFGzv1TpVGYekbOhPYa8SPrY07bRpNkv09rnnWFyWW7UEgXww9xEdqOVapT_s12GGUW1VYrVxbc9_6Z29mScRAR_vhtUxc1Mzx-4VGEnQGxHTSN6BZ6ZOCnOg2gSSfGHgWqfWYHQVeVnp7KBekR6Kj9bjVK96v65IGCkY-jnDYtadwx1xAZMGwBLFSWjUpwFwuW9clHih3SjCMabYm2qOzXKJQ6NyQYMHGD_rrrqPHehYctluQw";

/// Public exponent shared by both fixtures (65537).
pub const KEY_E: &str = "AQAB";

/// An RSA signing key with the `kid` it is published under.
#[derive(Clone)]
pub struct TestSigningKey {
    pub kid: String,
    pem: &'static str,
    n: &'static str,
}

impl TestSigningKey {
    /// `rsa_key_01.pem` as `test-key-01`.
    pub fn primary() -> Self {
        Self::primary_with_kid("test-key-01")
    }

    /// `rsa_key_02.pem` as `test-key-02`.
    pub fn secondary() -> Self {
        Self::secondary_with_kid("test-key-02")
    }

    pub fn primary_with_kid(kid: &str) -> Self {
        Self {
            kid: kid.to_string(),
            pem: KEY_01_PEM,
            n: KEY_01_N,
        }
    }

    pub fn secondary_with_kid(kid: &str) -> Self {
        Self {
            kid: kid.to_string(),
            pem: KEY_02_PEM,
            n: KEY_02_N,
        }
    }

    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_rsa_pem(self.pem.as_bytes()).expect("fixture PEM must parse")
    }

    /// Public JWK as published by the auth service.
    pub fn jwk_json(&self) -> Value {
        json!({
            "kty": "RSA",
            "kid": self.kid,
            "alg": "RS256",
            "use": "sig",
            "n": self.n,
            "e": KEY_E,
        })
    }
}

/// A `{"keys": [...]}` document for the given keys, in order.
pub fn jwks_document(keys: &[&TestSigningKey]) -> Value {
    json!({ "keys": keys.iter().map(|key| key.jwk_json()).collect::<Vec<_>>() })
}
