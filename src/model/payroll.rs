use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Uniquely keyed by `(employee_id, month, year)`; re-generation
/// overwrites the prior row (last-write-wins, no history).
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PayrollRecord {
    pub id: u64,
    pub employee_id: u64,

    #[schema(example = 1)]
    pub month: u32,

    #[schema(example = 2026)]
    pub year: i32,

    #[schema(example = 30000.0)]
    pub basic_salary: f64,

    #[schema(example = 2000.0)]
    pub allowances: f64,

    #[schema(example = 272.73)]
    pub deductions: f64,

    /// `basic_salary + allowances - deductions`; may go negative.
    #[schema(example = 31727.27)]
    pub net_salary: f64,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub generated_at: Option<DateTime<Utc>>,
}
