//! User identities and the credential file behind them.

pub mod credential;
pub mod manager;
pub mod user;

pub use credential::{make_salted_hash, AuthMethod, Credential};
pub use manager::{NewUser, UserManager, UserTable, USERS_FILE};
pub use user::{User, UserRecord};
