use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// `unpaid -> deducted` is the only transition and it is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AdvanceStatus {
    Unpaid,
    Deducted,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AdvancePayment {
    pub id: u64,
    pub employee_id: u64,

    #[schema(example = 5000.0)]
    pub amount: f64,

    pub reason: Option<String>,

    #[schema(example = "unpaid", value_type = String)]
    pub status: String,

    /// `"MM-YYYY"` of the payroll run that consumed this advance.
    #[schema(example = "01-2026", nullable = true)]
    pub paid_in_month: Option<String>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}
