//! Append-only JSONL log of visitor activity, one file per shell session.
//!
//! Passwords never reach this log.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct ActivityLog {
    pub path: PathBuf,
    session_id: String,
    file: File,
}

#[derive(Serialize)]
struct Event<'a> {
    ts: DateTime<Utc>,
    session_id: &'a str,
    #[serde(rename = "type")]
    event_type: &'a str,
    #[serde(flatten)]
    data: serde_json::Value,
}

impl ActivityLog {
    pub fn new(path: &Path, session_id: &str) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            session_id: session_id.to_string(),
            file,
        })
    }

    pub fn log(&mut self, event_type: &str, data: serde_json::Value) -> Result<()> {
        let event = Event {
            ts: Utc::now(),
            session_id: &self.session_id,
            event_type,
            data,
        };
        let line = serde_json::to_string(&event)?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }

    pub fn command(&mut self, name: &str) -> Result<()> {
        self.log("command", serde_json::json!({ "name": name }))
    }

    pub fn registered(&mut self, email: &str, account_id: &str) -> Result<()> {
        self.log(
            "registered",
            serde_json::json!({ "email": email, "account_id": account_id }),
        )
    }

    pub fn login(&mut self, email: &str, ok: bool, role: Option<&str>) -> Result<()> {
        self.log(
            "login",
            serde_json::json!({ "email": email, "ok": ok, "role": role }),
        )
    }

    pub fn logout(&mut self, email: Option<&str>) -> Result<()> {
        self.log("logout", serde_json::json!({ "email": email }))
    }

    pub fn guard(&mut self, page: &str, redirect: Option<&str>) -> Result<()> {
        self.log(
            "guard",
            serde_json::json!({ "page": page, "redirect": redirect }),
        )
    }

    pub fn contact(&mut self, submission_id: &str) -> Result<()> {
        self.log("contact", serde_json::json!({ "id": submission_id }))
    }

    pub fn subscribe(&mut self, email: &str, outcome: &str) -> Result<()> {
        self.log(
            "subscribe",
            serde_json::json!({ "email": email, "outcome": outcome }),
        )
    }

    /// Log a storage write that failed after retries
    pub fn storage_error(&mut self, action: &str, error: &str) -> Result<()> {
        self.log(
            "storage_error",
            serde_json::json!({ "action": action, "error": error }),
        )
    }
}
