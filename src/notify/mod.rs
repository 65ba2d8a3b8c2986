use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::model::notification::{NewNotification, NotificationType, Priority};

/// Injected capability for dispatching user notifications. The payroll
/// writer treats delivery as best-effort: a failed `send` is logged by
/// the caller and never rolls back persisted data.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, note: NewNotification) -> sqlx::Result<()>;
}

/// Persists notifications to the relational store; real-time fan-out to
/// connected sessions is an external collaborator of this core.
pub struct DbNotifier {
    pool: MySqlPool,
}

impl DbNotifier {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Notifier for DbNotifier {
    async fn send(&self, note: NewNotification) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, title, message, type, priority, metadata)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(note.user_id)
        .bind(&note.title)
        .bind(&note.message)
        .bind(note.kind.to_string())
        .bind(note.priority.to_string())
        .bind(note.metadata.as_ref().map(|m| m.to_string()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// "Payslip ready" notification for one employee.
pub fn payslip_notice(user_id: u64, employee_id: u64, month: u32, year: i32) -> NewNotification {
    NewNotification {
        user_id,
        title: "Payslip Generated".to_string(),
        message: format!(
            "Your payslip for {month:02}/{year} has been generated and is ready for download."
        ),
        kind: NotificationType::System,
        priority: Priority::High,
        metadata: Some(serde_json::json!({
            "month": month,
            "year": year,
            "employeeId": employee_id,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payslip_notice_targets_the_account_not_the_employee() {
        let note = payslip_notice(42, 7, 3, 2026);
        assert_eq!(note.user_id, 42);
        assert_eq!(note.title, "Payslip Generated");
        assert!(note.message.contains("03/2026"));
        assert_eq!(note.kind, NotificationType::System);
        assert_eq!(note.priority, Priority::High);
        assert_eq!(note.metadata.unwrap()["employeeId"], 7);
    }

    #[test]
    fn notification_enums_serialize_lowercase() {
        assert_eq!(NotificationType::System.to_string(), "system");
        assert_eq!(Priority::High.to_string(), "high");
    }
}
