use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

const AVATAR_BASE_URL: &str = "https://api.dicebear.com/9.x/identicon/svg?seed=";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RegisterRequest {
    pub(crate) username: String,
    pub(crate) password: String,
}

impl RegisterRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let username = normalize_register_username(&self.username)?;
        let password_len = self.password.chars().count();
        if !(3..=128).contains(&password_len) {
            return Err(DomainError::Validation {
                field: "password",
                message: "must be 3..128 chars",
            });
        }
        Ok(Self {
            username,
            password: self.password,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) username: String,
    pub(crate) password: String,
}

impl LoginRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let username = self.username.trim();
        if username.is_empty() || username.chars().count() > 64 {
            return Err(DomainError::Validation {
                field: "username",
                message: "must be 1..64 chars",
            });
        }

        if self.password.is_empty() {
            return Err(DomainError::Validation {
                field: "password",
                message: "must not be empty",
            });
        }
        Ok(Self {
            username: username.to_string(),
            password: self.password,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ProfileUpdate {
    pub(crate) bio: Option<String>,
    pub(crate) avatar: Option<String>,
}

impl ProfileUpdate {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let bio = self.bio.map(|bio| bio.trim().to_string());
        if bio.as_ref().is_some_and(|bio| bio.chars().count() > 280) {
            return Err(DomainError::Validation {
                field: "bio",
                message: "must be at most 280 chars",
            });
        }

        let avatar = self.avatar.map(|avatar| avatar.trim().to_string());
        if let Some(avatar) = &avatar
            && !(avatar.starts_with("http://") || avatar.starts_with("https://"))
        {
            return Err(DomainError::Validation {
                field: "avatar",
                message: "must be an http(s) url",
            });
        }

        Ok(Self { bio, avatar })
    }
}

/// Stored user record. Optional fields default when absent from the data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct User {
    pub(crate) username: String,
    #[serde(default)]
    pub(crate) is_admin: bool,
    #[serde(default)]
    pub(crate) banned: bool,
    pub(crate) created_at: DateTime<Utc>,
    #[serde(default)]
    pub(crate) last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) avatar: String,
    #[serde(default)]
    pub(crate) bio: String,
}

impl User {
    pub(crate) fn new(
        username: impl Into<String>,
        is_admin: bool,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let username = normalize_register_username(&username.into())?;
        let avatar = default_avatar(&username);

        Ok(Self {
            username,
            is_admin,
            banned: false,
            created_at,
            last_seen: None,
            avatar,
            bio: String::new(),
        })
    }

    pub(crate) fn is(&self, username: &str) -> bool {
        same_username(&self.username, username)
    }

    /// Fills fields that older data files may leave empty.
    pub(crate) fn with_defaults(mut self) -> Self {
        if self.avatar.is_empty() {
            self.avatar = default_avatar(&self.username);
        }
        self
    }
}

pub(crate) fn same_username(left: &str, right: &str) -> bool {
    left.trim().to_lowercase() == right.trim().to_lowercase()
}

pub(crate) fn default_avatar(username: &str) -> String {
    format!("{AVATAR_BASE_URL}{username}")
}

fn normalize_register_username(username: &str) -> Result<String, DomainError> {
    let username = username.trim();
    let len = username.chars().count();
    if !(3..=64).contains(&len) {
        return Err(DomainError::Validation {
            field: "username",
            message: "must be 3..64 chars",
        });
    }
    if username.chars().any(char::is_whitespace) {
        return Err(DomainError::Validation {
            field: "username",
            message: "must not contain whitespace",
        });
    }
    Ok(username.to_string())
}
