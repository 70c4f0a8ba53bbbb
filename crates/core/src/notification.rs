//! Push notification composition.
//!
//! Builds the title, body, and routing data shown on a person's devices
//! when their task links change or a task comes due. Delivery lives in
//! `hearth_events`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::association::{AssociationChange, ChangeKind};
use crate::types::{DbId, Timestamp};

/// Event published after a task people sync commits.
pub const EVENT_TASK_PEOPLE_SYNCED: &str = "task.people_synced";

/// Event published by the reminder scheduler for due tasks.
pub const EVENT_TASK_REMINDER: &str = "task.reminder";

/// Event types whose payload carries a push batch under [`PAYLOAD_NOTIFICATIONS`].
pub const PUSH_EVENT_TYPES: &[&str] = &[EVENT_TASK_PEOPLE_SYNCED, EVENT_TASK_REMINDER];

/// Payload key holding the serialized `Vec<PushMessage>`.
pub const PAYLOAD_NOTIFICATIONS: &str = "notifications";

/// Maximum characters of a task title quoted in a notification body.
const MAX_QUOTED_TITLE: usize = 80;

/// What a notification says, before it is addressed to devices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    /// Routing data the client uses to open the right screen.
    pub data: serde_json::Value,
}

/// One notification addressed to one device token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    /// Device push token.
    pub to: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Content for an association change on a task.
///
/// `role_name` is the display name of the new role, if known.
pub fn association_content(
    task_id: DbId,
    task_title: &str,
    change: &AssociationChange,
    role_name: Option<&str>,
) -> NotificationContent {
    let quoted = quote_title(task_title);
    let (title, body) = match change.kind {
        ChangeKind::Assigned => (
            "New task".to_string(),
            match role_name {
                Some(role) => format!("You were added to {quoted} as {role}"),
                None => format!("You were added to {quoted}"),
            },
        ),
        ChangeKind::RoleChanged => (
            "Task role changed".to_string(),
            match role_name {
                Some(role) => format!("Your role in {quoted} is now {role}"),
                None => format!("Your role in {quoted} changed"),
            },
        ),
        ChangeKind::Removed => (
            "Removed from task".to_string(),
            format!("You were removed from {quoted}"),
        ),
    };

    NotificationContent {
        title,
        body,
        data: serde_json::json!({
            "type": "task",
            "kind": change.kind.as_str(),
            "task_id": task_id,
            "home_id": change.home_id,
            "role_id": change.role_id,
        }),
    }
}

/// Content for a due-task reminder.
pub fn reminder_content(task_id: DbId, task_title: &str, due_at: Timestamp) -> NotificationContent {
    NotificationContent {
        title: "Task due soon".to_string(),
        body: format!(
            "{} is due at {}",
            quote_title(task_title),
            due_at.format("%H:%M UTC")
        ),
        data: serde_json::json!({
            "type": "task",
            "kind": "reminder",
            "task_id": task_id,
        }),
    }
}

/// Address `content` to every device of a person.
pub fn address(content: &NotificationContent, destinations: &[String]) -> Vec<PushMessage> {
    destinations
        .iter()
        .map(|to| PushMessage {
            to: to.clone(),
            title: content.title.clone(),
            body: content.body.clone(),
            data: content.data.clone(),
        })
        .collect()
}

/// Build the push batch for a set of association changes.
///
/// Changes for persons without a registered device are skipped.
pub fn association_batch(
    task_id: DbId,
    task_title: &str,
    changes: &[AssociationChange],
    destinations: &HashMap<DbId, Vec<String>>,
    role_names: &HashMap<DbId, String>,
) -> Vec<PushMessage> {
    changes
        .iter()
        .filter_map(|change| {
            let devices = destinations.get(&change.person_id)?;
            let role = role_names.get(&change.role_id).map(String::as_str);
            let content = association_content(task_id, task_title, change, role);
            Some(address(&content, devices))
        })
        .flatten()
        .collect()
}

fn quote_title(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.chars().count() <= MAX_QUOTED_TITLE {
        format!("\"{trimmed}\"")
    } else {
        let cut: String = trimmed.chars().take(MAX_QUOTED_TITLE - 1).collect();
        format!("\"{cut}…\"")
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn change(kind: ChangeKind, person_id: DbId) -> AssociationChange {
        AssociationChange {
            kind,
            person_id,
            home_id: 3,
            role_id: 4,
        }
    }

    #[test]
    fn assigned_content_mentions_role() {
        let content = association_content(
            10,
            "Water plants",
            &change(ChangeKind::Assigned, 1),
            Some("helper"),
        );
        assert_eq!(content.title, "New task");
        assert_eq!(content.body, "You were added to \"Water plants\" as helper");
        assert_eq!(content.data["kind"], "assigned");
        assert_eq!(content.data["task_id"], 10);
        assert_eq!(content.data["home_id"], 3);
    }

    #[test]
    fn removed_content_has_no_role() {
        let content = association_content(
            10,
            "Water plants",
            &change(ChangeKind::Removed, 1),
            Some("helper"),
        );
        assert_eq!(content.body, "You were removed from \"Water plants\"");
        assert_eq!(content.data["kind"], "removed");
    }

    #[test]
    fn long_titles_are_truncated() {
        let title = "x".repeat(200);
        let content = association_content(1, &title, &change(ChangeKind::Removed, 1), None);
        assert!(content.body.chars().count() < 120);
        assert!(content.body.ends_with("…\""));
    }

    #[test]
    fn reminder_mentions_due_time() {
        let due = chrono::Utc.with_ymd_and_hms(2026, 3, 1, 18, 30, 0).unwrap();
        let content = reminder_content(5, "Take out trash", due);
        assert_eq!(content.body, "\"Take out trash\" is due at 18:30 UTC");
        assert_eq!(content.data["kind"], "reminder");
    }

    #[test]
    fn batch_skips_persons_without_devices() {
        let destinations = HashMap::from([(1, vec!["tok-a".to_string(), "tok-b".to_string()])]);
        let roles = HashMap::from([(4, "owner".to_string())]);
        let changes = [change(ChangeKind::Assigned, 1), change(ChangeKind::Removed, 2)];

        let batch = association_batch(10, "Dishes", &changes, &destinations, &roles);
        assert_eq!(batch.len(), 2);
        assert!(batch.iter().all(|m| m.title == "New task"));
        assert_eq!(batch[0].to, "tok-a");
        assert_eq!(batch[1].to, "tok-b");
    }

    #[test]
    fn push_message_round_trips_without_data() {
        let msg: PushMessage =
            serde_json::from_str(r#"{"to":"t","title":"a","body":"b"}"#).expect("parse");
        assert!(msg.data.is_null());
    }
}
