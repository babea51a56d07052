use serde::{Deserialize, Serialize};

use super::SessionError;

/// Who is using the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// As typed at login.
    pub username: String,
    /// Lowercased username without whitespace; namespaces the collections.
    pub handle: String,
    /// Placeholder avatar, the uppercased first letter of the username.
    pub avatar: String,
}

impl Identity {
    pub fn from_username(username: &str) -> Result<Self, SessionError> {
        let username = username.trim();
        let handle = handle_for(username);
        if handle.is_empty() {
            return Err(SessionError::EmptyUsername);
        }
        Ok(Identity {
            username: username.to_string(),
            avatar: avatar_for(username),
            handle,
        })
    }

    pub(super) fn is_valid(&self) -> bool {
        !self.handle.is_empty() && self.handle == handle_for(&self.handle)
    }
}

fn handle_for(username: &str) -> String {
    username
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn avatar_for(username: &str) -> String {
    username
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}
