//! Contact messages and newsletter subscriptions.

use crate::store::{StoreError, Storage};
use crate::validate::{self, Form, FormOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod keys {
    pub const CONTACTS: &str = "contacts";
    pub const NEWSLETTER: &str = "newsletter";
}

// Form fields with these names would clobber the record's own keys.
const RESERVED_FIELDS: &[&str] = &["id", "submittedAt"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub id: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed,
    AlreadySubscribed,
    InvalidEmail,
}

pub fn contacts(storage: &Storage) -> Vec<ContactSubmission> {
    storage.get(keys::CONTACTS).unwrap_or_default()
}

pub fn subscribers(storage: &Storage) -> Vec<String> {
    storage.get(keys::NEWSLETTER).unwrap_or_default()
}

/// Validate the form and, if it passes, append it to `contacts`.
pub fn submit_contact(
    storage: &mut Storage,
    form: &mut Form,
) -> Result<FormOutcome<ContactSubmission>, StoreError> {
    if !validate::validate(form) {
        return Ok(FormOutcome::Rejected);
    }

    let now = Utc::now();
    let fields = form
        .values()
        .into_iter()
        .filter(|(name, _)| !RESERVED_FIELDS.contains(&name.as_str()))
        .collect();
    let submission = ContactSubmission {
        id: format!("contact_{}", now.timestamp_millis()),
        fields,
        submitted_at: now,
    };

    let mut all: Vec<ContactSubmission> = storage.try_get(keys::CONTACTS)?.unwrap_or_default();
    all.push(submission.clone());
    storage.set(keys::CONTACTS, &all)?;
    Ok(FormOutcome::Accepted(submission))
}

/// Add `email` to the newsletter list unless it is invalid or already there.
pub fn subscribe(storage: &mut Storage, email: &str) -> Result<SubscribeOutcome, StoreError> {
    let email = email.trim();
    if !validate::is_valid_email(email) {
        return Ok(SubscribeOutcome::InvalidEmail);
    }

    let mut list: Vec<String> = storage.try_get(keys::NEWSLETTER)?.unwrap_or_default();
    if list.iter().any(|e| e == email) {
        return Ok(SubscribeOutcome::AlreadySubscribed);
    }

    list.push(email.to_string());
    storage.set(keys::NEWSLETTER, &list)?;
    Ok(SubscribeOutcome::Subscribed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{Field, FieldKind};

    fn contact_form(name: &str, email: &str, message: &str) -> Form {
        Form::new()
            .with(Field::new("name", FieldKind::Text, name))
            .with(Field::new("email", FieldKind::Email, email))
            .with(Field::new("message", FieldKind::TextArea, message))
    }

    #[test]
    fn test_subscribe_twice_keeps_one_entry() {
        let mut storage = Storage::memory();
        assert_eq!(
            subscribe(&mut storage, "reader@example.com").unwrap(),
            SubscribeOutcome::Subscribed
        );
        assert_eq!(
            subscribe(&mut storage, "  reader@example.com ").unwrap(),
            SubscribeOutcome::AlreadySubscribed
        );
        assert_eq!(subscribers(&storage), vec!["reader@example.com"]);
    }

    #[test]
    fn test_unreadable_lists_are_not_overwritten() {
        let mut storage = Storage::memory();
        storage.set(keys::NEWSLETTER, &serde_json::json!({ "a": 1 })).unwrap();
        storage.set(keys::CONTACTS, "garbage").unwrap();

        let err = subscribe(&mut storage, "reader@example.com").unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
        let mut form = contact_form("Jo", "jo@example.com", "Hi");
        assert!(submit_contact(&mut storage, &mut form).is_err());

        let kept: serde_json::Value = storage.get(keys::NEWSLETTER).unwrap();
        assert_eq!(kept, serde_json::json!({ "a": 1 }));
        assert_eq!(storage.get::<String>(keys::CONTACTS).as_deref(), Some("garbage"));
    }

    #[test]
    fn test_subscribe_invalid_email() {
        let mut storage = Storage::memory();
        assert_eq!(
            subscribe(&mut storage, "not-an-email").unwrap(),
            SubscribeOutcome::InvalidEmail
        );
        assert!(subscribers(&storage).is_empty());
    }

    #[test]
    fn test_contact_saved() {
        let mut storage = Storage::memory();
        let mut form = contact_form("Jo", "jo@example.com", "Loved issue 4");

        let saved = submit_contact(&mut storage, &mut form)
            .unwrap()
            .accepted()
            .unwrap();
        assert!(saved.id.starts_with("contact_"));
        assert_eq!(saved.fields.get("message").map(String::as_str), Some("Loved issue 4"));

        let stored = contacts(&storage);
        assert_eq!(stored, vec![saved]);
    }

    #[test]
    fn test_contact_rejected_when_invalid() {
        let mut storage = Storage::memory();
        let mut form = contact_form("Jo", "jo@", "");

        let outcome = submit_contact(&mut storage, &mut form).unwrap();
        assert_eq!(outcome, FormOutcome::Rejected);
        assert_eq!(form.errors().len(), 2);
        assert!(contacts(&storage).is_empty());
    }

    #[test]
    fn test_contact_record_shape() {
        let mut storage = Storage::memory();
        let mut form = contact_form("Jo", "jo@example.com", "Hi")
            .with(Field::new("id", FieldKind::Text, "spoofed"));

        let saved = submit_contact(&mut storage, &mut form)
            .unwrap()
            .accepted()
            .unwrap();
        let value = serde_json::to_value(&saved).unwrap();
        assert_eq!(value["id"], saved.id.as_str());
        assert_eq!(value["name"], "Jo");
        assert!(value.get("submittedAt").is_some());
    }

    #[test]
    fn test_contacts_append() {
        let mut storage = Storage::memory();
        for i in 0..3 {
            let mut form = contact_form("Jo", "jo@example.com", &format!("note {}", i));
            submit_contact(&mut storage, &mut form).unwrap();
        }
        assert_eq!(contacts(&storage).len(), 3);
    }
}
