//! Accounts and the current-user session.
//!
//! Accounts live in the store under `users`, the single session under
//! `currentUser`. There is no security model here: passwords are stored and
//! compared as plain strings.

use crate::store::{StoreError, Storage};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Storage keys owned by the auth manager.
pub mod keys {
    pub const CURRENT_USER: &str = "currentUser";
    pub const USERS: &str = "users";
}

/// Redirect targets shared with the surrounding site.
pub mod paths {
    pub const HOME: &str = "/index.html";
    pub const USER_LOGIN: &str = "/auth/user/login.html";
    pub const ADMIN_LOGIN: &str = "/auth/admin/admin-login.html";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Anything other than `"admin"` (other strings, null, numbers) reads as a user.
impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(role) if role == "admin" => Ok(Role::Admin),
            _ => Ok(Role::User),
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

/// The logged-in identity, derived from an [`Account`] at login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    pub login_time: DateTime<Utc>,
}

impl Session {
    fn from_account(account: &Account, now: DateTime<Utc>) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            name: account.name.clone(),
            role: account.role,
            login_time: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Sessions without a TTL never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) => now - self.login_time > ttl,
            None => false,
        }
    }
}

/// Registration input.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Outcome of a page guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Allow,
    Redirect(&'static str),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailTaken,

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

pub const REGISTRATION_OK: &str = "Registration successful";

/// What seeding the bootstrap admin did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminSeed {
    Created,
    /// An admin account with that email was already there; left untouched.
    Present,
    /// A non-admin account held the email; it now has the admin role and the
    /// configured password.
    Promoted,
}

/// Account and session manager.
///
/// Holds no state of its own beyond policy; the store is passed in by the
/// owning site context.
#[derive(Debug, Clone, Default)]
pub struct Auth {
    session_ttl: Option<Duration>,
}

impl Auth {
    pub fn new(session_ttl: Option<Duration>) -> Self {
        Self { session_ttl }
    }

    pub fn accounts(&self, storage: &Storage) -> Vec<Account> {
        storage.get(keys::USERS).unwrap_or_default()
    }

    // Writers must not treat an unreadable list as empty and overwrite it.
    fn stored_accounts(storage: &Storage) -> Result<Vec<Account>, StoreError> {
        Ok(storage.try_get(keys::USERS)?.unwrap_or_default())
    }

    pub fn register(&self, storage: &mut Storage, data: NewAccount) -> Result<Account, AuthError> {
        let accounts = Self::stored_accounts(storage)?;
        let id = next_user_id(&accounts, Utc::now().timestamp_millis());
        self.insert_account(storage, accounts, id, data, Role::User)
    }

    /// Provision the bootstrap admin through the registration path.
    ///
    /// The bootstrap credential must always reach an admin session, so a
    /// non-admin account already holding that email is promoted.
    pub fn seed_admin(&self, storage: &mut Storage, admin: NewAccount) -> Result<AdminSeed, AuthError> {
        let mut accounts = Self::stored_accounts(storage)?;
        let Some(pos) = accounts.iter().position(|a| a.email == admin.email) else {
            self.insert_account(storage, accounts, "admin".to_string(), admin, Role::Admin)?;
            return Ok(AdminSeed::Created);
        };

        let existing = &mut accounts[pos];
        if existing.role == Role::Admin {
            return Ok(AdminSeed::Present);
        }
        existing.role = Role::Admin;
        existing.password = admin.password;
        storage.set(keys::USERS, &accounts)?;
        Ok(AdminSeed::Promoted)
    }

    fn insert_account(
        &self,
        storage: &mut Storage,
        mut accounts: Vec<Account>,
        id: String,
        data: NewAccount,
        role: Role,
    ) -> Result<Account, AuthError> {
        if accounts.iter().any(|a| a.email == data.email) {
            return Err(AuthError::EmailTaken);
        }

        let account = Account {
            id,
            name: data.name,
            email: data.email,
            password: data.password,
            role,
            created_at: Utc::now(),
        };
        accounts.push(account.clone());
        storage.set(keys::USERS, &accounts)?;
        Ok(account)
    }

    /// Authenticate and replace any existing session.
    pub fn login(&self, storage: &mut Storage, email: &str, password: &str) -> Result<Session, AuthError> {
        let accounts = self.accounts(storage);
        let account = accounts
            .iter()
            .find(|a| a.email == email && a.password == password)
            .ok_or(AuthError::InvalidCredentials)?;

        let session = Session::from_account(account, Utc::now());
        storage.set(keys::CURRENT_USER, &session)?;
        Ok(session)
    }

    /// Drop the session and return where to send the visitor.
    pub fn logout(&self, storage: &mut Storage) -> Result<&'static str, AuthError> {
        storage.remove(keys::CURRENT_USER)?;
        Ok(paths::HOME)
    }

    /// The live session, if any. An expired session is removed on read.
    pub fn current_user(&self, storage: &mut Storage) -> Option<Session> {
        let session: Session = storage.get(keys::CURRENT_USER)?;
        if session.is_expired_at(Utc::now(), self.session_ttl) {
            if let Err(e) = storage.remove(keys::CURRENT_USER) {
                eprintln!("Warning: failed to drop expired session: {}", e);
            }
            return None;
        }
        Some(session)
    }

    pub fn is_logged_in(&self, storage: &mut Storage) -> bool {
        self.current_user(storage).is_some()
    }

    pub fn protect_page(&self, storage: &mut Storage) -> Guard {
        if self.is_logged_in(storage) {
            Guard::Allow
        } else {
            Guard::Redirect(paths::USER_LOGIN)
        }
    }

    pub fn protect_admin_page(&self, storage: &mut Storage) -> Guard {
        match self.current_user(storage) {
            Some(session) if session.is_admin() => Guard::Allow,
            _ => Guard::Redirect(paths::ADMIN_LOGIN),
        }
    }
}

/// `user_<millis>`, bumped forward if an account already holds that id.
fn next_user_id(accounts: &[Account], now_millis: i64) -> String {
    let mut millis = now_millis;
    loop {
        let id = format!("user_{}", millis);
        if !accounts.iter().any(|a| a.id == id) {
            return id;
        }
        millis += 1;
    }
}
