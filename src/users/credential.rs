//! Password verification schemes.
//!
//! - `hash` records store `salt,digest` where digest is
//!   `hex(SHA-256(salt + password))` and the salt is a UUID v4 in simple form.
//! - `cleartext` records store the password itself.
//! - Any other method name is kept verbatim and never verifies.
//!
//! Comparisons use `subtle::ConstantTimeEq`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::errors::{Result, WikiError};

/// Authentication schemes a new user can be created with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    #[default]
    Hash,
    Cleartext,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Hash => "hash",
            AuthMethod::Cleartext => "cleartext",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = WikiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hash" => Ok(AuthMethod::Hash),
            "cleartext" => Ok(AuthMethod::Cleartext),
            other => Err(WikiError::InvalidCredentialMethod(other.to_string())),
        }
    }
}

/// The secret half of a credential record
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Hash { salt: String, digest: String },
    Cleartext { password: String },
    /// A method this crate does not know; verification always fails.
    /// Whatever secret fields it carried are kept for rewriting.
    Unsupported {
        method: String,
        hash: Option<String>,
        password: Option<String>,
    },
}

impl Credential {
    /// Build a credential for `password` with a fresh salt where applicable
    pub fn new(method: AuthMethod, password: &str) -> Self {
        match method {
            AuthMethod::Hash => {
                let salt = new_salt();
                let digest = salted_digest(&salt, password);
                Credential::Hash { salt, digest }
            }
            AuthMethod::Cleartext => Credential::Cleartext {
                password: password.to_string(),
            },
        }
    }

    /// Parse a stored `salt,digest` value
    pub fn from_stored_hash(stored: &str) -> Option<Self> {
        let (salt, digest) = stored.split_once(',')?;
        if salt.is_empty() || digest.is_empty() {
            return None;
        }
        Some(Credential::Hash {
            salt: salt.to_string(),
            digest: digest.to_string(),
        })
    }

    pub fn method_name(&self) -> &str {
        match self {
            Credential::Hash { .. } => AuthMethod::Hash.as_str(),
            Credential::Cleartext { .. } => AuthMethod::Cleartext.as_str(),
            Credential::Unsupported { method, .. } => method,
        }
    }

    /// Verify `candidate`, reporting unknown methods as errors
    pub fn check(&self, candidate: &str) -> Result<bool> {
        match self {
            Credential::Hash { salt, digest } => {
                let computed = salted_digest(salt, candidate);
                Ok(bool::from(computed.as_bytes().ct_eq(digest.as_bytes())))
            }
            Credential::Cleartext { password } => {
                Ok(bool::from(candidate.as_bytes().ct_eq(password.as_bytes())))
            }
            Credential::Unsupported { method, .. } => {
                Err(WikiError::InvalidCredentialMethod(method.clone()))
            }
        }
    }

    /// Verify `candidate`; anything but a positive match is a denial
    pub fn verify(&self, candidate: &str) -> bool {
        match self.check(candidate) {
            Ok(ok) => ok,
            Err(e) => {
                log::warn!("Denying authentication: {}", e);
                false
            }
        }
    }
}

/// Secrets stay out of logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("method", &self.method_name())
            .finish_non_exhaustive()
    }
}

fn new_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

fn salted_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// `salt,digest` for a fresh random salt
pub fn make_salted_hash(password: &str) -> String {
    let salt = new_salt();
    let digest = salted_digest(&salt, password);
    format!("{},{}", salt, digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_credentials_verify() {
        let cred = Credential::new(AuthMethod::Hash, "pass1");
        assert!(cred.verify("pass1"));
        assert!(!cred.verify("pass2"));
        assert!(!cred.verify(""));
    }

    #[test]
    fn salts_differ_between_calls() {
        let a = make_salted_hash("same");
        let b = make_salted_hash("same");
        assert_ne!(a, b);
        assert!(Credential::from_stored_hash(&a).unwrap().verify("same"));
    }

    #[test]
    fn stored_hash_requires_both_halves() {
        assert!(Credential::from_stored_hash("nocomma").is_none());
        assert!(Credential::from_stored_hash(",digest").is_none());
        assert!(Credential::from_stored_hash("salt,").is_none());
    }

    #[test]
    fn digest_is_sha256_of_salt_and_password() {
        let cred = Credential::from_stored_hash(
            "abc,6ca13d52ca70c883e0f0bb101e425a89e8624de51db2d2392593af6a84118090",
        )
        .unwrap();
        // sha256("abc123")
        assert!(cred.verify("123"));
    }

    #[test]
    fn cleartext_credentials_verify() {
        let cred = Credential::new(AuthMethod::Cleartext, "pass2");
        assert!(cred.verify("pass2"));
        assert!(!cred.verify("pass22"));
    }

    #[test]
    fn unsupported_method_fails_closed() {
        let cred = Credential::Unsupported {
            method: "ldap".into(),
            hash: None,
            password: None,
        };
        assert!(!cred.verify("anything"));
        assert!(matches!(
            cred.check("anything"),
            Err(WikiError::InvalidCredentialMethod(m)) if m == "ldap"
        ));
    }

    #[test]
    fn parses_method_names() {
        assert_eq!("hash".parse::<AuthMethod>().unwrap(), AuthMethod::Hash);
        assert_eq!(" Cleartext ".parse::<AuthMethod>().unwrap(), AuthMethod::Cleartext);
        assert!("md5".parse::<AuthMethod>().is_err());
    }

    #[test]
    fn debug_hides_secrets() {
        let cred = Credential::new(AuthMethod::Cleartext, "hunter2");
        assert!(!format!("{:?}", cred).contains("hunter2"));
    }
}
