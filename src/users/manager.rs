use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use log::{debug, error, info, warn};
use tempfile::NamedTempFile;

use crate::errors::{Result, WikiError};
use crate::users::credential::{AuthMethod, Credential};
use crate::users::user::{User, UserRecord};

/// File name of the credential store inside the user directory
pub const USERS_FILE: &str = "users.json";

/// Username to record, as stored on disk
pub type UserTable = BTreeMap<String, UserRecord>;

/// Options for a new account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub method: AuthMethod,
    pub roles: Vec<String>,
    pub active: bool,
}

impl Default for NewUser {
    fn default() -> Self {
        Self {
            method: AuthMethod::Hash,
            roles: Vec::new(),
            active: true,
        }
    }
}

/// Owner of the credential file.
///
/// Every mutation rereads and rewrites the whole file while holding a
/// process-local lock; writes go through a temp file and a rename so readers
/// never see a partial file.
#[derive(Debug)]
pub struct UserManager {
    file: PathBuf,
    default_method: AuthMethod,
    lock: Mutex<()>,
}

impl UserManager {
    /// Store at `<dir>/users.json`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::with_file(dir.as_ref().join(USERS_FILE))
    }

    pub fn with_file(file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        debug!("Creating UserManager for {:?}", file);
        Self {
            file,
            default_method: AuthMethod::default(),
            lock: Mutex::new(()),
        }
    }

    pub fn with_default_method(mut self, method: AuthMethod) -> Self {
        self.default_method = method;
        self
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, so a poisoned lock has nothing to repair.
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The whole store; empty when the file does not exist yet.
    pub fn read(&self) -> Result<UserTable> {
        let content = match fs::read_to_string(&self.file) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Credential file {:?} absent, treating as empty", self.file);
                return Ok(UserTable::new());
            }
            Err(e) => {
                error!("Failed to read credential file {:?}: {}", self.file, e);
                return Err(WikiError::Io(e));
            }
        };
        serde_json::from_str(&content).map_err(|source| {
            error!("Credential file {:?} is malformed: {}", self.file, source);
            WikiError::MalformedStore {
                path: self.file.clone(),
                source,
            }
        })
    }

    /// Replace the whole store atomically.
    pub fn write(&self, data: &UserTable) -> Result<()> {
        let dir = match self.file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let content = serde_json::to_string_pretty(data).map_err(|source| {
            WikiError::MalformedStore {
                path: self.file.clone(),
                source,
            }
        })?;

        let mut temp = NamedTempFile::new_in(&dir)?;
        temp.write_all(content.as_bytes())?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(&self.file).map_err(|e| {
            error!("Failed to replace credential file {:?}: {}", self.file, e.error);
            WikiError::Io(e.error)
        })?;

        debug!("Wrote {} users to {:?}", data.len(), self.file);
        Ok(())
    }

    pub fn add_user(&self, username: &str, password: &str) -> Result<User> {
        let options = NewUser {
            method: self.default_method,
            ..NewUser::default()
        };
        self.add_user_with(username, password, options)
    }

    pub fn add_user_with(&self, username: &str, password: &str, options: NewUser) -> Result<User> {
        let _guard = self.guard();
        let mut users = self.read()?;
        if users.contains_key(username) {
            warn!("Refusing to add duplicate user '{}'", username);
            return Err(WikiError::AlreadyExists(username.to_string()));
        }

        let record = UserRecord {
            active: options.active,
            roles: options.roles.into_iter().collect::<BTreeSet<_>>(),
            authenticated: false,
            credential: Credential::new(options.method, password),
        };
        users.insert(username.to_string(), record.clone());
        self.write(&users)?;

        info!("Added user '{}' ({})", username, options.method);
        Ok(User::new(username, record))
    }

    pub fn get_user(&self, username: &str) -> Result<Option<User>> {
        let mut users = self.read()?;
        Ok(users
            .remove(username)
            .map(|record| User::new(username, record)))
    }

    /// Replace the record for an existing user.
    pub fn update(&self, username: &str, record: UserRecord) -> Result<()> {
        let _guard = self.guard();
        let mut users = self.read()?;
        match users.get_mut(username) {
            Some(existing) => *existing = record,
            None => return Err(WikiError::NotFound(username.to_string())),
        }
        self.write(&users)?;
        info!("Updated user '{}'", username);
        Ok(())
    }

    /// Remove a user; false when there was nobody to remove.
    pub fn delete_user(&self, username: &str) -> Result<bool> {
        let _guard = self.guard();
        let mut users = self.read()?;
        let removed = users.remove(username).is_some();
        self.write(&users)?;
        if removed {
            info!("Deleted user '{}'", username);
        }
        Ok(removed)
    }
}
