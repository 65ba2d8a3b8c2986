use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NotificationType {
    System,
    Alert,
    Info,
    Leave,
    Attendance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

/// Payload accepted by the notification capability; the subsystem's own
/// delivery internals (sockets, read state) live outside this core.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: u64,
    pub title: String,
    pub message: String,
    pub kind: NotificationType,
    pub priority: Priority,
    pub metadata: Option<serde_json::Value>,
}
