use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ZvaultError};

/// 8 lowercase hex characters from 4 OS-random bytes.
pub fn new_id() -> String {
    let mut bytes = [0u8; 4];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Splits a comma separated tag string, trimming and dropping empties.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretKind {
    #[serde(rename = "password")]
    Password,
    #[serde(rename = "apikey")]
    ApiKey,
    #[serde(rename = "sshkey")]
    SshKey,
    #[serde(rename = "note")]
    Note,
}

impl SecretKind {
    pub const ALL: [SecretKind; 4] = [
        SecretKind::Password,
        SecretKind::ApiKey,
        SecretKind::SshKey,
        SecretKind::Note,
    ];

    /// Stored type tag; search matches it exactly.
    pub fn as_str(self) -> &'static str {
        match self {
            SecretKind::Password => "password",
            SecretKind::ApiKey => "apikey",
            SecretKind::SshKey => "sshkey",
            SecretKind::Note => "note",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SecretKind::Password => "password",
            SecretKind::ApiKey => "api key",
            SecretKind::SshKey => "ssh key",
            SecretKind::Note => "note",
        }
    }

    pub fn badge(self) -> &'static str {
        match self {
            SecretKind::Password => "[pw]",
            SecretKind::ApiKey => "[api]",
            SecretKind::SshKey => "[ssh]",
            SecretKind::Note => "[note]",
        }
    }

    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            SecretKind::Password => &["url", "username", "password"],
            SecretKind::ApiKey => &["service", "key"],
            SecretKind::SshKey => &["label", "private_key", "public_key"],
            SecretKind::Note => &["content"],
        }
    }

    pub fn optional_fields(self) -> &'static [&'static str] {
        match self {
            SecretKind::Password => &["totp_secret", "notes"],
            SecretKind::ApiKey => &["notes"],
            SecretKind::SshKey => &["passphrase", "notes"],
            SecretKind::Note => &[],
        }
    }

    fn allows(self, key: &str) -> bool {
        self.required_fields().contains(&key) || self.optional_fields().contains(&key)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SecretKind,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Secret {
    /// Builds a secret after checking the field map against the kind's key set.
    pub fn new(
        kind: SecretKind,
        name: impl Into<String>,
        fields: BTreeMap<String, String>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if let Some(missing) = kind
            .required_fields()
            .iter()
            .find(|k| !fields.contains_key(**k))
        {
            return Err(ZvaultError::InvalidRecord(format!(
                "{} secret is missing field '{missing}'",
                kind.label()
            )));
        }
        if let Some(unknown) = fields.keys().find(|k| !kind.allows(k)) {
            return Err(ZvaultError::InvalidRecord(format!(
                "{} secret does not take field '{unknown}'",
                kind.label()
            )));
        }
        Ok(Self {
            id: new_id(),
            name: name.into(),
            kind,
            fields,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn password(name: &str, url: &str, username: &str, password: &str, now: DateTime<Utc>) -> Self {
        Self::unchecked(
            SecretKind::Password,
            name,
            &[("url", url), ("username", username), ("password", password)],
            now,
        )
    }

    pub fn api_key(name: &str, service: &str, key: &str, now: DateTime<Utc>) -> Self {
        Self::unchecked(SecretKind::ApiKey, name, &[("service", service), ("key", key)], now)
    }

    pub fn ssh_key(
        name: &str,
        label: &str,
        private_key: &str,
        public_key: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self::unchecked(
            SecretKind::SshKey,
            name,
            &[("label", label), ("private_key", private_key), ("public_key", public_key)],
            now,
        )
    }

    pub fn note(name: &str, content: &str, now: DateTime<Utc>) -> Self {
        Self::unchecked(SecretKind::Note, name, &[("content", content)], now)
    }

    // Only called with a kind's own required keys.
    fn unchecked(kind: SecretKind, name: &str, pairs: &[(&str, &str)], now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            kind,
            fields: pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Missing keys read as empty.
    pub fn field(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn set_field(&mut self, key: &str, value: impl Into<String>) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub fn url(&self) -> &str {
        self.field("url")
    }

    pub fn username(&self) -> &str {
        self.field("username")
    }

    pub fn password_value(&self) -> &str {
        self.field("password")
    }

    pub fn totp_secret(&self) -> &str {
        self.field("totp_secret")
    }

    pub fn notes(&self) -> &str {
        self.field("notes")
    }

    pub fn service(&self) -> &str {
        self.field("service")
    }

    pub fn key(&self) -> &str {
        self.field("key")
    }

    pub fn label(&self) -> &str {
        self.field("label")
    }

    pub fn private_key(&self) -> &str {
        self.field("private_key")
    }

    pub fn public_key(&self) -> &str {
        self.field("public_key")
    }

    pub fn passphrase(&self) -> &str {
        self.field("passphrase")
    }

    pub fn content(&self) -> &str {
        self.field("content")
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Priority {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "high")]
    High,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::None, Priority::Low, Priority::Medium, Priority::High];

    pub fn label(self) -> &'static str {
        match self {
            Priority::None => "none",
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Priority::None => 0,
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }

    /// none → low → medium → high → none
    pub fn next(self) -> Self {
        match self {
            Priority::None => Priority::Low,
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDate>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            done: false,
            priority: Priority::None,
            due: None,
            tags: Vec::new(),
            created_at: now,
            completed_at: None,
        }
    }

    /// Flips `done`; `completed_at` follows the transition.
    pub fn toggle_done(&mut self, now: DateTime<Utc>) {
        self.done = !self.done;
        self.completed_at = if self.done { Some(now) } else { None };
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Done,
}

/// Task list query. Empty fields match everything; set fields conjoin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub status: StatusFilter,
    pub priority: Option<Priority>,
    pub tag: Option<String>,
}

impl Filter {
    pub fn pending() -> Self {
        Self {
            status: StatusFilter::Pending,
            ..Self::default()
        }
    }

    pub fn done() -> Self {
        Self {
            status: StatusFilter::Done,
            ..Self::default()
        }
    }

    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self.status {
            StatusFilter::Pending if task.done => return false,
            StatusFilter::Done if !task.done => return false,
            _ => {}
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        match &self.tag {
            Some(tag) if !tag.is_empty() => task.has_tag(tag),
            _ => true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EncryptedBlob {
    pub nonce: String,
    pub data: String,
}

/// Plaintext payload of the on-disk vault.
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct VaultData {
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub secrets: Vec<Secret>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}
