use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Leave,
    Holiday,
}

/// One row per `(employee_id, date)`, unique.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,

    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(value_type = Option<String>, format = "time")]
    pub check_in: Option<NaiveTime>,

    #[schema(value_type = Option<String>, format = "time")]
    pub check_out: Option<NaiveTime>,

    #[schema(example = "present", value_type = String)]
    pub status: String,

    pub check_in_location: Option<String>,
    pub check_out_location: Option<String>,
    pub worked_hours: Option<f64>,

    /// Set when the row was written by the leave-approval side effect.
    pub leave_type: Option<String>,
}
