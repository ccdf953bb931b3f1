//! # Marketplace Data Model
//!
//! Users with a single role each, and the products sellers list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role held by a user. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Buyer,
    Pending,
    Seller,
    Rejected,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Pending => "pending",
            Role::Seller => "seller",
            Role::Rejected => "rejected",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(Role::Buyer),
            "pending" => Ok(Role::Pending),
            "seller" => Ok(Role::Seller),
            "rejected" => Ok(Role::Rejected),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A user known to the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub telegram_id: i64,
    pub handle: Option<String>,
    pub role: Role,
    /// Last language reported by the client, used for notifications
    pub language_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// `@handle` when known, the numeric id otherwise
    pub fn display_name(&self) -> String {
        match &self.handle {
            Some(handle) => format!("@{handle}"),
            None => self.telegram_id.to_string(),
        }
    }
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub owner_id: i64,
    /// Owner's handle at read time, filled by listing queries
    pub owner_handle: Option<String>,
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn is_available(&self) -> bool {
        self.stock > 0
    }
}

/// Product field targeted by an edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditField {
    Price,
    Stock,
}

/// The sender of an inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub handle: Option<String>,
    pub language_code: Option<String>,
}

impl Actor {
    pub fn new(id: i64, handle: Option<&str>) -> Self {
        Self {
            id,
            handle: handle.map(|h| h.to_string()),
            language_code: None,
        }
    }

    pub fn with_language(mut self, language_code: Option<&str>) -> Self {
        self.language_code = language_code.map(|s| s.to_string());
        self
    }

    pub fn lang(&self) -> Option<&str> {
        self.language_code.as_deref()
    }

    pub fn display_name(&self) -> String {
        match &self.handle {
            Some(handle) => format!("@{handle}"),
            None => self.id.to_string(),
        }
    }
}
