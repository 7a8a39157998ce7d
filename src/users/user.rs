use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::users::credential::Credential;

/// One entry of the credential file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredRecord", into = "StoredRecord")]
pub struct UserRecord {
    pub active: bool,
    pub roles: BTreeSet<String>,
    /// Session flag kept for the web layer; carries no meaning at rest
    pub authenticated: bool,
    pub credential: Credential,
}

impl UserRecord {
    pub fn new(credential: Credential) -> Self {
        Self {
            active: true,
            roles: BTreeSet::new(),
            authenticated: false,
            credential,
        }
    }
}

/// On-disk shape: the method name plus whichever secret it uses
#[derive(Serialize, Deserialize)]
struct StoredRecord {
    active: bool,
    #[serde(default)]
    roles: BTreeSet<String>,
    authentication_method: String,
    #[serde(default)]
    authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password: Option<String>,
}

impl TryFrom<StoredRecord> for UserRecord {
    type Error = String;

    fn try_from(stored: StoredRecord) -> Result<Self, Self::Error> {
        let credential = match (stored.authentication_method.as_str(), stored.hash, stored.password) {
            ("hash", Some(hash), None) => Credential::from_stored_hash(&hash)
                .ok_or_else(|| "hash must have the form salt,digest".to_string())?,
            ("cleartext", None, Some(password)) => Credential::Cleartext { password },
            ("hash", ..) => return Err("hash records need a hash and no password".to_string()),
            ("cleartext", ..) => {
                return Err("cleartext records need a password and no hash".to_string());
            }
            (other, hash, password) => Credential::Unsupported {
                method: other.to_string(),
                hash,
                password,
            },
        };
        Ok(UserRecord {
            active: stored.active,
            roles: stored.roles,
            authenticated: stored.authenticated,
            credential,
        })
    }
}

impl From<UserRecord> for StoredRecord {
    fn from(record: UserRecord) -> Self {
        let (authentication_method, hash, password) = match record.credential {
            Credential::Hash { salt, digest } => {
                ("hash".to_string(), Some(format!("{},{}", salt, digest)), None)
            }
            Credential::Cleartext { password } => ("cleartext".to_string(), None, Some(password)),
            Credential::Unsupported { method, hash, password } => (method, hash, password),
        };
        StoredRecord {
            active: record.active,
            roles: record.roles,
            authentication_method,
            authenticated: record.authenticated,
            hash,
            password,
        }
    }
}

/// A named view over one credential record
#[derive(Debug, Clone)]
pub struct User {
    name: String,
    record: UserRecord,
}

impl User {
    pub fn new(name: &str, record: UserRecord) -> Self {
        Self {
            name: name.to_string(),
            record,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same as `name`; the identifier a session layer stores
    pub fn get_id(&self) -> &str {
        &self.name
    }

    pub fn record(&self) -> &UserRecord {
        &self.record
    }

    pub fn into_record(self) -> UserRecord {
        self.record
    }

    pub fn check_password(&self, candidate: &str) -> bool {
        self.record.credential.verify(candidate)
    }

    pub fn is_active(&self) -> bool {
        self.record.active
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.record.roles.contains(role)
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.record.roles.iter().map(String::as_str)
    }

    pub fn is_authenticated(&self) -> bool {
        self.record.authenticated
    }

    pub fn is_anonymous(&self) -> bool {
        false
    }
}
