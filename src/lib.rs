//! Behaviour layer for a magazine website: accounts and sessions over a
//! key-value store, the article catalog, form validation, navbar state,
//! toasts, contact/newsletter submissions and image fallbacks.

pub mod activity;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod nav;
pub mod notify;
pub mod placeholder;
pub mod site;
pub mod store;
pub mod submissions;
pub mod validate;
