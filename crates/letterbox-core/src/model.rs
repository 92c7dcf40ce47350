// ABOUTME: Defines the User struct representing one persisted letterbox account.
// ABOUTME: Holds profile details, the rolodex of contacts, and cached letter ids.

use serde::{Deserialize, Serialize};

/// A single user account. The handle doubles as the storage key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub handle: String,
    /// Stored in plaintext; never written out by serde.
    #[serde(skip_serializing, default)]
    pub password: String,
    pub email: String,
    pub notify_by_email: bool,
    /// Handles of other users this user keeps as contacts.
    pub rolodex: Vec<String>,
    /// Ids of received letters.
    pub mailbox_cache: Vec<i64>,
    /// Ids of sent letters.
    pub sent_cache: Vec<i64>,
}

impl User {
    /// Create a user with the given details, email notifications off and
    /// empty rolodex and caches.
    pub fn new(
        handle: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            handle: handle.into(),
            password: password.into(),
            email: email.into(),
            ..Self::default()
        }
    }
}
