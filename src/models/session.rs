use serde::Serialize;

use super::{Identity, User};

/// Session lifecycle, driven solely by auth events
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(tag = "status", content = "user", rename_all = "snake_case")]
pub enum SessionState {
    /// No auth event received yet
    #[default]
    Unknown,
    /// Signed in; the user document is being fetched
    Authenticating,
    Authenticated(User),
    Unauthenticated,
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// Sign-in state change emitted by the auth service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Identity),
    SignedOut,
}

impl From<Option<Identity>> for AuthEvent {
    fn from(identity: Option<Identity>) -> Self {
        match identity {
            Some(identity) => AuthEvent::SignedIn(identity),
            None => AuthEvent::SignedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_value(SessionState::Unauthenticated).unwrap();
        assert_eq!(json, serde_json::json!({"status": "unauthenticated"}));

        let identity = Identity::new("uid-1", None);
        let state = SessionState::Authenticated(User::from_parts(&identity, None));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["status"], "authenticated");
        assert_eq!(json["user"]["userId"], "uid-1");
    }
}
