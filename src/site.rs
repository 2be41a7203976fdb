//! The site context.
//!
//! `Site` owns the store, the account manager, the catalog and the toast
//! queue. Every visitor action goes through it; it performs the action, raises
//! the toast the page would show, and records the activity.

use crate::activity::ActivityLog;
use crate::auth::{self, Account, AdminSeed, Auth, AuthError, Guard, NewAccount, Session};
use crate::catalog::{Article, Catalog};
use crate::config::Config;
use crate::nav::NavState;
use crate::notify::{ToastKind, ToastQueue};
use crate::store::{StoreError, Storage};
use crate::submissions::{self, ContactSubmission, SubscribeOutcome};
use crate::validate::{self, Field, FieldKind, Form, FormOutcome};

pub struct Site {
    storage: Storage,
    auth: Auth,
    catalog: Catalog,
    toasts: ToastQueue,
    recent_limit: usize,
    admin: NewAccount,
    activity: Option<ActivityLog>,
}

impl Site {
    /// Build the site around `storage` and seed the bootstrap admin.
    pub fn new(config: &Config, storage: Storage) -> Result<Self, AuthError> {
        let admin = config.admin();
        let mut site = Self {
            storage: storage.with_write_retries(config.write_retries()),
            auth: Auth::new(config.session_ttl()),
            catalog: Catalog::sample(),
            toasts: ToastQueue::new(config.toast_duration_ms()),
            recent_limit: config.recent_limit(),
            admin: NewAccount {
                name: admin.name,
                email: admin.email,
                password: admin.password,
            },
            activity: None,
        };
        site.seed_admin()?;
        Ok(site)
    }

    fn seed_admin(&mut self) -> Result<(), AuthError> {
        let seeded = self.auth.seed_admin(&mut self.storage, self.admin.clone())?;
        if seeded == AdminSeed::Promoted {
            eprintln!(
                "Warning: account {} was not an admin; promoted it and reset its password",
                self.admin.email
            );
        }
        Ok(())
    }

    pub fn with_activity(mut self, log: ActivityLog) -> Self {
        self.activity = Some(log);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut ToastQueue {
        &mut self.toasts
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.auth.accounts(&self.storage)
    }

    pub fn current_user(&mut self) -> Option<Session> {
        self.auth.current_user(&mut self.storage)
    }

    pub fn nav_state(&mut self) -> NavState {
        NavState::from_session(self.current_user().as_ref())
    }

    pub fn recent(&self) -> Vec<&Article> {
        self.catalog.get_recent(self.recent_limit)
    }

    fn record<F>(&mut self, f: F)
    where
        F: FnOnce(&mut ActivityLog) -> anyhow::Result<()>,
    {
        if let Some(log) = self.activity.as_mut() {
            if let Err(e) = f(log) {
                eprintln!("Warning: failed to write activity log: {}", e);
            }
        }
    }

    fn storage_failed(&mut self, action: &str, error: &StoreError) {
        self.toasts.push(
            "Storage Error",
            &format!("Could not save your changes: {}", error),
            ToastKind::Error,
        );
        let message = error.to_string();
        self.record(|log| log.storage_error(action, &message));
    }

    pub fn command(&mut self, name: &str) {
        self.record(|log| log.command(name));
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<Session, AuthError> {
        match self.auth.login(&mut self.storage, email, password) {
            Ok(session) => {
                self.toasts.push(
                    "Login Successful",
                    &format!("Welcome back, {}!", session.name),
                    ToastKind::Success,
                );
                let role = session.role.as_str();
                self.record(|log| log.login(email, true, Some(role)));
                Ok(session)
            }
            Err(AuthError::Storage(e)) => {
                self.storage_failed("login", &e);
                Err(AuthError::Storage(e))
            }
            Err(e) => {
                self.toasts.push("Login Failed", &e.to_string(), ToastKind::Error);
                self.record(|log| log.login(email, false, None));
                Err(e)
            }
        }
    }

    /// Validate the registration fields, then create the account.
    pub fn register(&mut self, data: NewAccount) -> Result<FormOutcome<Account>, AuthError> {
        let mut form = registration_form(&data);
        if !validate::validate(&mut form) {
            self.toasts.push(
                "Validation Error",
                "Please fill in all required fields correctly",
                ToastKind::Error,
            );
            return Ok(FormOutcome::Rejected);
        }

        match self.auth.register(&mut self.storage, data) {
            Ok(account) => {
                self.toasts
                    .push("Success", auth::REGISTRATION_OK, ToastKind::Success);
                self.record(|log| log.registered(&account.email, &account.id));
                Ok(FormOutcome::Accepted(account))
            }
            Err(AuthError::Storage(e)) => {
                self.storage_failed("register", &e);
                Err(AuthError::Storage(e))
            }
            Err(e) => {
                self.toasts
                    .push("Registration Failed", &e.to_string(), ToastKind::Error);
                Err(e)
            }
        }
    }

    /// End the session; returns the page to send the visitor to.
    pub fn logout(&mut self) -> Result<&'static str, AuthError> {
        let email = self.current_user().map(|s| s.email);
        match self.auth.logout(&mut self.storage) {
            Ok(target) => {
                self.toasts.push(
                    "Logged Out",
                    "You have been successfully logged out",
                    ToastKind::Success,
                );
                self.record(|log| log.logout(email.as_deref()));
                Ok(target)
            }
            Err(AuthError::Storage(e)) => {
                self.storage_failed("logout", &e);
                Err(AuthError::Storage(e))
            }
            Err(e) => Err(e),
        }
    }

    /// Wipe every stored key, then seed the bootstrap admin again.
    pub fn reset(&mut self) -> Result<(), AuthError> {
        let result = match self.storage.clear() {
            Ok(()) => self.seed_admin(),
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(()) => {
                self.toasts
                    .push("Store Reset", "All stored data was cleared", ToastKind::Info);
                self.record(|log| log.log("reset", serde_json::json!({})));
                Ok(())
            }
            Err(AuthError::Storage(e)) => {
                self.storage_failed("reset", &e);
                Err(AuthError::Storage(e))
            }
            Err(e) => Err(e),
        }
    }

    pub fn guard_page(&mut self) -> Guard {
        let guard = self.auth.protect_page(&mut self.storage);
        self.record_guard("user", guard);
        guard
    }

    pub fn guard_admin_page(&mut self) -> Guard {
        let guard = self.auth.protect_admin_page(&mut self.storage);
        self.record_guard("admin", guard);
        guard
    }

    fn record_guard(&mut self, page: &str, guard: Guard) {
        let redirect = match guard {
            Guard::Allow => None,
            Guard::Redirect(target) => Some(target),
        };
        self.record(|log| log.guard(page, redirect));
    }

    pub fn submit_contact(&mut self, form: &mut Form) -> Result<FormOutcome<ContactSubmission>, StoreError> {
        match submissions::submit_contact(&mut self.storage, form) {
            Ok(FormOutcome::Accepted(saved)) => {
                self.toasts.push(
                    "Success",
                    "Your message has been sent successfully!",
                    ToastKind::Success,
                );
                self.record(|log| log.contact(&saved.id));
                Ok(FormOutcome::Accepted(saved))
            }
            Ok(FormOutcome::Rejected) => {
                self.toasts.push(
                    "Validation Error",
                    "Please fill in all required fields correctly",
                    ToastKind::Error,
                );
                Ok(FormOutcome::Rejected)
            }
            Err(e) => {
                self.storage_failed("contact", &e);
                Err(e)
            }
        }
    }

    pub fn subscribe(&mut self, email: &str) -> Result<SubscribeOutcome, StoreError> {
        let outcome = match submissions::subscribe(&mut self.storage, email) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.storage_failed("subscribe", &e);
                return Err(e);
            }
        };

        let (title, message, kind, label) = match outcome {
            SubscribeOutcome::Subscribed => (
                "Success",
                "Thank you for subscribing to our newsletter!",
                ToastKind::Success,
                "subscribed",
            ),
            SubscribeOutcome::AlreadySubscribed => (
                "Already Subscribed",
                "This email is already subscribed",
                ToastKind::Warning,
                "already_subscribed",
            ),
            SubscribeOutcome::InvalidEmail => (
                "Invalid Email",
                "Please enter a valid email address",
                ToastKind::Error,
                "invalid_email",
            ),
        };
        self.toasts.push(title, message, kind);
        let email = email.trim();
        self.record(|log| log.subscribe(email, label));
        Ok(outcome)
    }
}

fn registration_form(data: &NewAccount) -> Form {
    Form::new()
        .with(Field::new("name", FieldKind::Text, &data.name))
        .with(Field::new("email", FieldKind::Email, &data.email))
        .with(Field::new("password", FieldKind::Password, &data.password))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;

    fn site() -> Site {
        Site::new(&Config::default(), Storage::memory()).unwrap()
    }

    fn account(name: &str, email: &str, password: &str) -> NewAccount {
        NewAccount {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_admin_seeded_on_start() {
        let mut site = site();
        let session = site.login("admin@gmail.com", "admin123").unwrap();
        assert!(session.is_admin());
        assert_eq!(site.nav_state(), NavState::LoggedInAdmin);
        assert_eq!(site.guard_admin_page(), Guard::Allow);
    }

    #[test]
    fn test_register_validates_first() {
        let mut site = site();
        let outcome = site.register(account("Jo", "jo@example.com", "123")).unwrap();
        assert_eq!(outcome, FormOutcome::Rejected);
        assert_eq!(site.accounts().len(), 1);
        assert_eq!(site.toasts().last().unwrap().title, "Validation Error");
    }

    #[test]
    fn test_register_login_logout() {
        let mut site = site();
        site.register(account("Jo", "jo@example.com", "secret1"))
            .unwrap()
            .accepted()
            .unwrap();
        assert_eq!(site.toasts().last().unwrap().message, "Registration successful");

        site.login("jo@example.com", "secret1").unwrap();
        assert_eq!(site.nav_state(), NavState::LoggedInUser);
        assert_eq!(site.guard_page(), Guard::Allow);

        assert_eq!(site.logout().unwrap(), auth::paths::HOME);
        assert_eq!(site.nav_state(), NavState::LoggedOut);
        assert_eq!(site.toasts().last().unwrap().title, "Logged Out");
    }

    #[test]
    fn test_failed_login_toast() {
        let mut site = site();
        assert!(site.login("ghost@example.com", "whatever").is_err());
        let toast = site.toasts().last().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.message, "Invalid email or password");
    }

    #[test]
    fn test_subscribe_toasts() {
        let mut site = site();
        site.subscribe("reader@example.com").unwrap();
        assert_eq!(site.toasts().last().unwrap().kind, ToastKind::Success);
        site.subscribe("reader@example.com").unwrap();
        assert_eq!(site.toasts().last().unwrap().title, "Already Subscribed");
        site.subscribe("nope").unwrap();
        assert_eq!(site.toasts().last().unwrap().title, "Invalid Email");
    }

    #[test]
    fn test_storage_failure_surfaces() {
        // Room for the seeded admin only
        let mut site = Site::new(
            &Config::default(),
            Storage::new(Box::new(MemoryBackend::with_quota(200))),
        )
        .unwrap();

        let err = site
            .register(account("Jo", "jo@example.com", "secret1"))
            .unwrap_err();
        assert!(matches!(err, AuthError::Storage(StoreError::QuotaExceeded { .. })));
        assert_eq!(site.toasts().last().unwrap().title, "Storage Error");
        assert_eq!(site.accounts().len(), 1);
    }

    #[test]
    fn test_legacy_accounts_survive_start() {
        let legacy = serde_json::json!([
            {"id": "user_1", "name": "Ed", "email": "ed@example.com",
             "password": "secret1", "role": "editor", "createdAt": "2026-01-01T00:00:00Z"},
            {"id": "user_2", "name": "Bo", "email": "bo@example.com", "password": "secret2"}
        ]);
        let mut storage = Storage::memory();
        storage.set(auth::keys::USERS, &legacy).unwrap();

        let mut site = Site::new(&Config::default(), storage).unwrap();
        assert_eq!(site.accounts().len(), 3);
        assert!(site.login("ed@example.com", "secret1").is_ok());
        assert!(site.login("admin@gmail.com", "admin123").unwrap().is_admin());
    }

    #[test]
    fn test_unreadable_accounts_block_start() {
        let mut storage = Storage::memory();
        storage.set(auth::keys::USERS, "corrupted").unwrap();

        let err = Site::new(&Config::default(), storage).err().unwrap();
        assert!(matches!(err, AuthError::Storage(StoreError::Decode { .. })));
    }

    #[test]
    fn test_registered_admin_email_is_promoted() {
        let legacy = serde_json::json!([
            {"id": "user_9", "name": "Early Bird", "email": "admin@gmail.com",
             "password": "mine123", "role": "user"}
        ]);
        let mut storage = Storage::memory();
        storage.set(auth::keys::USERS, &legacy).unwrap();

        let mut site = Site::new(&Config::default(), storage).unwrap();
        let session = site.login("admin@gmail.com", "admin123").unwrap();
        assert!(session.is_admin());
        assert_eq!(site.nav_state(), NavState::LoggedInAdmin);
        assert_eq!(site.accounts().len(), 1);
    }

    #[test]
    fn test_reset_clears_everything_but_the_admin() {
        let mut site = site();
        site.register(account("Jo", "jo@example.com", "secret1")).unwrap();
        site.login("jo@example.com", "secret1").unwrap();
        site.subscribe("reader@example.com").unwrap();

        site.reset().unwrap();
        assert_eq!(site.accounts().len(), 1);
        assert!(site.current_user().is_none());
        assert!(submissions::subscribers(site.storage()).is_empty());
        assert_eq!(site.toasts().last().unwrap().title, "Store Reset");
        assert!(site.login("admin@gmail.com", "admin123").is_ok());
    }

    #[test]
    fn test_recent_uses_configured_limit() {
        let mut config = Config::default();
        config.catalog.recent_limit = Some(2);
        let site = Site::new(&config, Storage::memory()).unwrap();
        assert_eq!(site.recent().len(), 2);
    }
}
