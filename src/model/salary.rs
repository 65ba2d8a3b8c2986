use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One-to-one compensation parameters per employee.
///
/// `deduction_rate` is the percent of the daily salary charged per
/// unprotected absence day (0-100).
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct SalaryProfile {
    #[schema(example = 1)]
    pub employee_id: u64,

    #[schema(example = 30000.0)]
    pub basic_salary: f64,

    #[schema(example = 2000.0)]
    pub allowance: f64,

    #[schema(example = 10.0)]
    pub deduction_rate: f64,
}
