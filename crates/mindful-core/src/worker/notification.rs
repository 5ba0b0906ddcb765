use serde::{Deserialize, Serialize};

use super::REMINDER_TAG;
use crate::notify::VIBRATION_PATTERN;

pub const APP_TITLE: &str = "Mindful Moments";
pub const DEFAULT_PUSH_BODY: &str = "Time for your daily meditation!";
pub const REMINDER_TITLE: &str = "Daily Meditation Reminder";
pub const REMINDER_BODY: &str = "Take a moment to practice mindfulness today.";

pub const ACTION_START: &str = "start-meditation";
pub const ACTION_DISMISS: &str = "dismiss";

const ICON: &str = "/assets/icons/icon-192x192.png";
const BADGE: &str = "/assets/icons/icon-72x72.png";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

impl NotificationAction {
    fn new(action: &str, title: &str) -> Self {
        Self {
            action: action.into(),
            title: title.into(),
            icon: BADGE.into(),
        }
    }
}

/// A system notification the host should display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vibrate: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<NotificationAction>,
    #[serde(default)]
    pub require_interaction: bool,
    #[serde(default)]
    pub silent: bool,
}

impl Notification {
    /// Notification for a push message; an absent payload uses the default
    /// text.
    pub fn push(payload: Option<&str>, now_ms: u64) -> Self {
        Self {
            title: APP_TITLE.into(),
            body: payload.unwrap_or(DEFAULT_PUSH_BODY).into(),
            icon: ICON.into(),
            badge: BADGE.into(),
            tag: None,
            vibrate: VIBRATION_PATTERN.to_vec(),
            data: Some(serde_json::json!({ "dateOfArrival": now_ms, "primaryKey": 1 })),
            actions: vec![
                NotificationAction::new(ACTION_START, "Start Meditation"),
                NotificationAction::new(ACTION_DISMISS, "Dismiss"),
            ],
            require_interaction: false,
            silent: false,
        }
    }

    pub fn reminder() -> Self {
        Self {
            title: REMINDER_TITLE.into(),
            body: REMINDER_BODY.into(),
            icon: ICON.into(),
            badge: BADGE.into(),
            tag: Some(REMINDER_TAG.into()),
            vibrate: Vec::new(),
            data: None,
            actions: Vec::new(),
            require_interaction: false,
            silent: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_defaults() {
        let n = Notification::push(None, 1_700_000_000_000);
        assert_eq!(n.title, "Mindful Moments");
        assert_eq!(n.body, "Time for your daily meditation!");
        assert_eq!(n.vibrate, vec![200, 100, 200]);
        assert_eq!(n.data.as_ref().unwrap()["primaryKey"], 1);
        assert_eq!(n.data.as_ref().unwrap()["dateOfArrival"], 1_700_000_000_000u64);
        let actions: Vec<_> = n.actions.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(actions, vec!["start-meditation", "dismiss"]);

        assert_eq!(Notification::push(Some("Breathe"), 0).body, "Breathe");
    }

    #[test]
    fn reminder_is_tagged() {
        let n = Notification::reminder();
        assert_eq!(n.tag.as_deref(), Some("meditation-reminder"));
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["requireInteraction"], false);
        assert!(json.get("actions").is_none());
    }
}
