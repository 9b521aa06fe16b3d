//! Role Tags
//!
//! A role tag decides which database account backs the session after login.
//! Tags are stored as lowercase strings in `user_permissions.role_tag`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Application role assigned to an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleTag {
    /// Store owner managing a store closet
    StoreOwner,
    /// Stylist composing outfits
    Stylist,
    /// Personal closet user
    Personal,
    /// Application administrator
    Admin,
    /// Low-privilege fallback
    AppClient,
}

impl RoleTag {
    /// All role tags, in menu order
    pub const ALL: [Self; 5] =
        [Self::StoreOwner, Self::Stylist, Self::Personal, Self::Admin, Self::AppClient];

    /// Roles a new account may pick for itself
    pub const SELF_SERVICE: [Self; 3] = [Self::StoreOwner, Self::Stylist, Self::Personal];

    /// Tag as stored in the role table
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StoreOwner => "storeowner",
            Self::Stylist => "stylist",
            Self::Personal => "personal",
            Self::Admin => "admin",
            Self::AppClient => "appclient",
        }
    }

    /// Database account that backs sessions for this role
    #[must_use]
    pub const fn default_account(&self) -> &'static str {
        match self {
            Self::StoreOwner => "storeowner",
            Self::Stylist => "stylist",
            Self::Personal => "personal",
            Self::Admin => "appadmin",
            Self::AppClient => "appclient",
        }
    }

    /// Map a stored tag to a role
    ///
    /// Unrecognized tags fall back to the low-privilege client role.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "storeowner" => Self::StoreOwner,
            "stylist" => Self::Stylist,
            "personal" => Self::Personal,
            "admin" => Self::Admin,
            _ => Self::AppClient,
        }
    }

    /// Letter used for this role on the account creation prompt
    #[must_use]
    pub const fn choice_key(&self) -> Option<char> {
        match self {
            Self::StoreOwner => Some('a'),
            Self::Stylist => Some('b'),
            Self::Personal => Some('c'),
            Self::Admin | Self::AppClient => None,
        }
    }

    /// Parse an account creation choice (`a`, `b` or `c`, any case)
    #[must_use]
    pub fn from_choice(input: &str) -> Option<Self> {
        let key = input.trim().chars().next()?.to_ascii_lowercase();
        Self::SELF_SERVICE.into_iter().find(|role| role.choice_key() == Some(key))
    }

    /// Human label for prompts
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::StoreOwner => "store owner",
            Self::Stylist => "stylist",
            Self::Personal => "personal",
            Self::Admin => "administrator",
            Self::AppClient => "client",
        }
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
