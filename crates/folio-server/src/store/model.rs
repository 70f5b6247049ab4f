use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Current schema version, stamped into `meta.version` on every save.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Bookkeeping block rewritten by the store on every save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub last_updated: String,
    pub version: String,
}

/// The admin credential embedded in the document. Never returned to
/// unauthenticated callers; [`super::ConfigStore::public_projection`]
/// strips it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminCredential {
    pub username: String,
    pub password_hash: String,
}

/// Site counters, updated in place by message and visit handlers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_visitors: u64,
    pub total_messages: u64,
    pub projects_count: u64,
    pub years_experience: u64,
}

/// A contact-form submission, stored newest-first in `messages`.
/// Field names are camelCase on the wire to match the public form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub timestamp: String,
    pub read: bool,
}

impl Message {
    /// Build a fresh unread message. The id is the creation timestamp plus a
    /// random suffix so two submissions within the same second cannot collide.
    pub fn new(
        first_name: String,
        last_name: String,
        email: String,
        subject: String,
        message: String,
    ) -> Self {
        Self {
            id: generate_message_id(),
            first_name,
            last_name,
            email,
            subject,
            message,
            timestamp: Utc::now().to_rfc3339(),
            read: false,
        }
    }

    /// Apply a partial-field patch. Fields present in `patch` overwrite the
    /// stored values; everything else is untouched. Fails if the merged
    /// result no longer deserializes as a message.
    pub fn apply_patch(&self, patch: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        let mut merged = serde_json::to_value(self)?;
        if let Some(obj) = merged.as_object_mut() {
            for (k, v) in patch {
                obj.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(merged)
    }
}

/// Generate a message id: `msg_<unix seconds>_<4 hex chars>`.
fn generate_message_id() -> String {
    use rand::Rng;
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let suffix: [u8; 2] = rand::thread_rng().gen();
    format!("msg_{}_{}", ts, hex::encode(suffix))
}

/// The whole-state document: exactly one exists per deployment, read in
/// full and written in full on every mutation (last writer wins).
///
/// Presentation sections are free-form JSON so the admin panel can PUT
/// arbitrary content through unchanged; only the blocks the server itself
/// reads or mutates are typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigDocument {
    pub meta: Meta,
    pub admin: AdminCredential,
    pub personal_info: Value,
    pub social_links: Value,
    pub skills: Vec<Value>,
    pub projects: Vec<Value>,
    pub experience: Vec<Value>,
    pub education: Vec<Value>,
    pub certifications: Vec<Value>,
    pub messages: Vec<Message>,
    pub stats: Stats,
    pub theme: Value,
}

impl ConfigDocument {
    /// The default document a fresh deployment starts from.
    pub fn default_with_admin(username: &str, password_hash: &str) -> Self {
        Self {
            meta: Meta {
                last_updated: Utc::now().to_rfc3339(),
                version: SCHEMA_VERSION.to_owned(),
            },
            admin: AdminCredential {
                username: username.to_owned(),
                password_hash: password_hash.to_owned(),
            },
            personal_info: json!({
                "name": "Your Name",
                "title": "Your Title",
                "subtitle": "Your Subtitle",
                "email": "email@example.com",
                "phone": "+1 234 567 890",
                "location": "City, Country",
                "bio": "Your bio goes here...",
                "profile_image": "",
                "resume_link": "",
            }),
            social_links: json!({
                "github": "",
                "linkedin": "",
                "twitter": "",
                "instagram": "",
                "youtube": "",
                "dribbble": "",
            }),
            skills: Vec::new(),
            projects: Vec::new(),
            experience: Vec::new(),
            education: Vec::new(),
            certifications: Vec::new(),
            messages: Vec::new(),
            stats: Stats::default(),
            theme: json!({
                "primary_color": "#6366f1",
                "secondary_color": "#8b5cf6",
                "accent_color": "#06b6d4",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_message() -> Message {
        Message::new(
            "Ada".into(),
            "Lovelace".into(),
            "ada@example.com".into(),
            "Hello".into(),
            "First!".into(),
        )
    }

    #[test]
    fn new_message_is_unread_with_prefixed_id() {
        let msg = sample_message();
        assert!(!msg.read);
        assert!(msg.id.starts_with("msg_"));
    }

    #[test]
    fn message_ids_do_not_collide_within_a_second() {
        let a = sample_message();
        let b = sample_message();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn message_serializes_camel_case() {
        let v = serde_json::to_value(sample_message()).unwrap();
        assert!(v.get("firstName").is_some());
        assert!(v.get("lastName").is_some());
        assert!(v.get("first_name").is_none());
    }

    #[test]
    fn patch_overwrites_only_given_fields() {
        let msg = sample_message();
        let patch = serde_json::from_value::<Map<String, Value>>(json!({"read": true})).unwrap();
        let patched = msg.apply_patch(&patch).unwrap();
        assert!(patched.read);
        assert_eq!(patched.subject, msg.subject);
        assert_eq!(patched.id, msg.id);
    }

    #[test]
    fn patch_with_wrong_type_fails() {
        let msg = sample_message();
        let patch =
            serde_json::from_value::<Map<String, Value>>(json!({"read": "yes"})).unwrap();
        assert!(msg.apply_patch(&patch).is_err());
    }

    #[test]
    fn document_tolerates_missing_sections() {
        // An admin PUT without the admin block still deserializes.
        let doc: ConfigDocument =
            serde_json::from_value(json!({"skills": [{"name": "Rust"}]})).unwrap();
        assert_eq!(doc.skills.len(), 1);
        assert!(doc.admin.username.is_empty());
    }
}
