//! Members tracking for presence channels.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

use crate::transports::NativeMember;

/// A presence channel member as delivered to listeners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// User ID
    #[serde(rename = "userID")]
    pub user_id: String,
    /// User info decoded from its wire JSON form
    #[serde(rename = "userInfo")]
    pub user_info: Value,
}

impl Member {
    pub fn new(user_id: impl Into<String>, user_info: Value) -> Self {
        Self {
            user_id: user_id.into(),
            user_info,
        }
    }

    /// Decode a member reported by the transport.
    ///
    /// Empty info becomes `null`; info that is not valid JSON is kept as a
    /// string value.
    pub fn from_native(member: &NativeMember) -> Self {
        let user_info = if member.info.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&member.info).unwrap_or_else(|e| {
                warn!("Undecodable user info for member {}: {}", member.id, e);
                Value::String(member.info.clone())
            })
        };

        Self {
            user_id: member.id.clone(),
            user_info,
        }
    }
}

/// Roster of a presence channel
#[derive(Debug, Default)]
pub struct Members {
    /// Map of user_id to member
    members: RwLock<HashMap<String, Member>>,
}

impl Members {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roster with the initial member list
    pub fn on_subscription(&self, initial: &[Member]) {
        let mut members = self.members.write();
        members.clear();
        for member in initial {
            members.insert(member.user_id.clone(), member.clone());
        }
    }

    /// Add a member, returning it if it was not already present
    pub fn add(&self, member: Member) -> Option<Member> {
        let mut members = self.members.write();

        if members.contains_key(&member.user_id) {
            return None;
        }

        members.insert(member.user_id.clone(), member.clone());
        Some(member)
    }

    /// Remove a member
    pub fn remove(&self, user_id: &str) -> Option<Member> {
        self.members.write().remove(user_id)
    }

    /// Get all members, ordered by user ID
    pub fn all(&self) -> Vec<Member> {
        let mut all: Vec<Member> = self.members.read().values().cloned().collect();
        all.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        all
    }

    /// Get member count
    pub fn count(&self) -> usize {
        self.members.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_member_from_native_decodes_info() {
        let member = Member::from_native(&NativeMember::new("u1", r#"{"name":"Ada"}"#));
        assert_eq!(member.user_id, "u1");
        assert_eq!(member.user_info, json!({"name": "Ada"}));

        let empty = Member::from_native(&NativeMember::new("u2", ""));
        assert_eq!(empty.user_info, Value::Null);

        let raw = Member::from_native(&NativeMember::new("u3", "not json"));
        assert_eq!(raw.user_info, Value::String("not json".to_string()));
    }

    #[test]
    fn test_member_serializes_with_listener_field_names() {
        let member = Member::new("u1", json!({}));
        let value = serde_json::to_value(&member).unwrap();
        assert_eq!(value, json!({"userID": "u1", "userInfo": {}}));
    }

    #[test]
    fn test_members_add_remove() {
        let members = Members::new();

        assert!(members.add(Member::new("user1", Value::Null)).is_some());
        assert!(members.add(Member::new("user1", Value::Null)).is_none());
        assert_eq!(members.count(), 1);

        assert_eq!(members.remove("user1").map(|m| m.user_id), Some("user1".to_string()));
        assert!(members.remove("user1").is_none());
        assert_eq!(members.count(), 0);
    }

    #[test]
    fn test_on_subscription_replaces_roster() {
        let members = Members::new();
        members.add(Member::new("stale", Value::Null));

        members.on_subscription(&[
            Member::new("u2", json!({})),
            Member::new("u1", json!({})),
        ]);

        let ids: Vec<String> = members.all().into_iter().map(|m| m.user_id).collect();
        assert_eq!(ids, vec!["u1", "u2"]);
    }
}
