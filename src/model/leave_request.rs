use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveType {
    Annual,
    Sick,
    Unpaid,
}

/// Inclusive `[start_date, end_date]` range; only `approved` requests
/// overlapping the target month affect payroll.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,

    #[schema(example = "annual", value_type = String)]
    pub leave_type: String,

    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,

    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,

    #[schema(example = "pending", value_type = String)]
    pub status: String,

    /// Inclusive day count, derived at creation, editable by admin.
    pub days: u32,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}
