use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::payroll::PayrollRecord;
use crate::model::salary::SalaryProfile;
use crate::notify::Notifier;
use crate::payroll::{self, GenerateError};
use crate::payroll::calc::month_year_key;

#[derive(Deserialize, ToSchema)]
pub struct GeneratePayroll {
    #[schema(example = 1, minimum = 1, maximum = 12)]
    pub month: u32,

    #[schema(example = 2026, minimum = 2000, maximum = 2100)]
    pub year: i32,
}

#[derive(Deserialize, ToSchema)]
pub struct UpsertSalary {
    #[schema(example = 1001)]
    pub employee_id: u64,

    #[schema(example = 30000.0)]
    pub basic_salary: f64,

    #[schema(example = 2000.0)]
    pub allowance: f64,

    /// Percent of daily salary charged per absence day (0-100)
    #[schema(example = 10.0)]
    pub deduction_rate: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateAdvance {
    #[schema(example = 1001)]
    pub employee_id: u64,

    #[schema(example = 5000.0)]
    pub amount: f64,

    #[schema(example = "Medical emergency", nullable = true)]
    pub reason: Option<String>,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct PayrollWithName {
    pub id: u64,
    pub employee_id: u64,
    pub name: String,
    pub month: u32,
    pub year: i32,
    pub basic_salary: f64,
    pub allowances: f64,
    pub deductions: f64,
    pub net_salary: f64,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub generated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct PayslipRow {
    pub id: u64,
    pub employee_id: u64,
    pub name: String,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub month: u32,
    pub year: i32,
    pub basic_salary: f64,
    pub allowances: f64,
    pub deductions: f64,
    pub net_salary: f64,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub generated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct AdvanceLine {
    pub amount: f64,
    pub reason: Option<String>,
}

/// A single payroll record plus the advance payments consumed in that
/// period.
#[derive(Serialize, ToSchema)]
pub struct PayslipResponse {
    #[serde(flatten)]
    pub record: PayslipRow,
    pub advance_payments: Vec<AdvanceLine>,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct AdvanceWithName {
    pub id: u64,
    pub employee_id: u64,
    pub employee_name: String,
    pub amount: f64,
    pub reason: Option<String>,
    pub status: String,
    pub paid_in_month: Option<String>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

pub(crate) fn valid_month(month: u32) -> bool {
    (1..=12).contains(&month)
}

pub(crate) fn valid_year(year: i32) -> bool {
    (2000..=2100).contains(&year)
}

/* =========================
Generate payroll (Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/payroll/generate",
    request_body = GeneratePayroll,
    responses(
        (status = 200, description = "Payroll generated", body = Object, example = json!({
            "message": "Payroll generated and notifications sent successfully"
        })),
        (status = 400, description = "Month or year out of range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No employees found"),
        (status = 409, description = "A run for this period is already in progress"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn generate_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    notifier: web::Data<dyn Notifier>,
    payload: web::Json<GeneratePayroll>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    // Rejected before any storage access.
    if !valid_month(payload.month) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Invalid month"
        })));
    }
    if !valid_year(payload.year) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Invalid year"
        })));
    }

    match payroll::generate(
        pool.get_ref(),
        notifier.get_ref(),
        &config.weekend_days,
        payload.month,
        payload.year,
    )
    .await
    {
        Ok(summary) => {
            tracing::info!(
                month = payload.month,
                year = payload.year,
                employees = summary.employees,
                notified = summary.notified,
                "Payroll generation finished"
            );
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": "Payroll generated and notifications sent successfully"
            })))
        }
        Err(GenerateError::NoEmployees) => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "No employees found"
        }))),
        Err(GenerateError::RunInProgress) => Ok(HttpResponse::Conflict().json(serde_json::json!({
            "message": "Payroll generation already running for this period"
        }))),
        Err(GenerateError::Db(e)) => {
            tracing::error!(error = %e, month = payload.month, year = payload.year, "Payroll generation failed");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

/* =========================
List all payroll records (HR/Admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/payroll",
    responses(
        (status = 200, description = "All payroll records with employee names", body = [PayrollWithName]),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let records = sqlx::query_as::<_, PayrollWithName>(
        r#"
        SELECT p.id, p.employee_id, e.name, p.month, p.year,
               p.basic_salary, p.allowances, p.deductions, p.net_salary, p.generated_at
        FROM payroll p
        JOIN employees e ON p.employee_id = e.id
        ORDER BY p.generated_at DESC
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch payroll list");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(records))
}

/* =========================
Payroll history for one employee
========================= */
#[utoipa::path(
    get,
    path = "/api/payroll/employee/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, body = [PayrollRecord]),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn employee_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    // Employees may only read their own history.
    if auth.is_employee() && auth.employee_id != Some(employee_id) {
        return Err(actix_web::error::ErrorForbidden("Not your payroll"));
    }

    let records = sqlx::query_as::<_, PayrollRecord>(
        r#"
        SELECT id, employee_id, month, year, basic_salary, allowances,
               deductions, net_salary, generated_at
        FROM payroll
        WHERE employee_id = ?
        ORDER BY generated_at DESC
        "#,
    )
    .bind(employee_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to fetch employee payroll");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(records))
}

/* =========================
Payslip for one employee and period
========================= */
#[utoipa::path(
    get,
    path = "/api/payroll/payslip/{employee_id}/{month}/{year}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        ("month" = u32, Path, description = "Month (1-12)"),
        ("year" = i32, Path, description = "Year (2000-2100)")
    ),
    responses(
        (status = 200, body = PayslipResponse),
        (status = 400, description = "Invalid month or year"),
        (status = 404, description = "Payslip not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn payslip(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, u32, i32)>,
) -> actix_web::Result<impl Responder> {
    let (employee_id, month, year) = path.into_inner();

    if !valid_month(month) || !valid_year(year) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Invalid month or year"
        })));
    }

    if auth.is_employee() && auth.employee_id != Some(employee_id) {
        return Err(actix_web::error::ErrorForbidden("Not your payslip"));
    }

    let record = sqlx::query_as::<_, PayslipRow>(
        r#"
        SELECT p.id, p.employee_id, e.name, e.department, e.job_title,
               p.month, p.year, p.basic_salary, p.allowances, p.deductions,
               p.net_salary, p.generated_at
        FROM payroll p
        JOIN employees e ON p.employee_id = e.id
        WHERE p.employee_id = ? AND p.month = ? AND p.year = ?
        "#,
    )
    .bind(employee_id)
    .bind(month)
    .bind(year)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to fetch payslip");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(record) = record else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Payslip not found"
        })));
    };

    let advance_payments = sqlx::query_as::<_, AdvanceLine>(
        r#"
        SELECT amount, reason
        FROM advance_payments
        WHERE employee_id = ? AND paid_in_month = ?
        "#,
    )
    .bind(employee_id)
    .bind(month_year_key(month, year))
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to fetch consumed advances");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(PayslipResponse {
        record,
        advance_payments,
    }))
}

/* =========================
Upsert salary profile (Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/payroll/employee-salary",
    request_body = UpsertSalary,
    responses(
        (status = 200, description = "Salary data saved", body = Object, example = json!({
            "message": "Salary data saved successfully"
        })),
        (status = 400, description = "Invalid input data"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn upsert_salary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<UpsertSalary>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if payload.basic_salary < 0.0
        || payload.allowance < 0.0
        || !(0.0..=100.0).contains(&payload.deduction_rate)
    {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Invalid input data"
        })));
    }

    sqlx::query(
        r#"
        INSERT INTO employee_salary (employee_id, basic_salary, allowance, deduction_rate)
        VALUES (?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            basic_salary = VALUES(basic_salary),
            allowance = VALUES(allowance),
            deduction_rate = VALUES(deduction_rate)
        "#,
    )
    .bind(payload.employee_id)
    .bind(payload.basic_salary)
    .bind(payload.allowance)
    .bind(payload.deduction_rate)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id = payload.employee_id, "Failed to save salary data");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Salary data saved successfully"
    })))
}

/* =========================
Fetch salary profile (HR/Admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/payroll/employee-salary/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, body = SalaryProfile),
        (status = 401),
        (status = 403),
        (status = 404, description = "No salary profile for this employee")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_salary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();

    let profile = sqlx::query_as::<_, SalaryProfile>(
        r#"
        SELECT employee_id, basic_salary, allowance, deduction_rate
        FROM employee_salary
        WHERE employee_id = ?
        "#,
    )
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to fetch salary profile");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match profile {
        Some(p) => Ok(HttpResponse::Ok().json(p)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "No salary profile for this employee"
        }))),
    }
}

/* =========================
Create advance payment (Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/payroll/advance-payment",
    request_body = CreateAdvance,
    responses(
        (status = 200, description = "Advance payment created", body = Object, example = json!({
            "message": "Advance payment created successfully",
            "id": 1
        })),
        (status = 400, description = "Invalid input data"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn create_advance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateAdvance>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if payload.amount <= 0.0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Invalid input data"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO advance_payments (employee_id, amount, reason)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(payload.employee_id)
    .bind(payload.amount)
    .bind(&payload.reason)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id = payload.employee_id, "Failed to create advance payment");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Advance payment created successfully",
        "id": result.last_insert_id()
    })))
}

/* =========================
List advance payments (HR/Admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/payroll/advance-payments",
    responses(
        (status = 200, body = [AdvanceWithName]),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_advances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let advances = sqlx::query_as::<_, AdvanceWithName>(
        r#"
        SELECT ap.id, ap.employee_id, e.name AS employee_name, ap.amount,
               ap.reason, ap.status, ap.paid_in_month, ap.created_at
        FROM advance_payments ap
        JOIN employees e ON ap.employee_id = e.id
        ORDER BY ap.created_at DESC
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch advance payments");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(advances))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_bounds_are_inclusive() {
        assert!(valid_month(1));
        assert!(valid_month(12));
        assert!(!valid_month(0));
        assert!(!valid_month(13));
    }

    #[test]
    fn year_bounds_are_inclusive() {
        assert!(valid_year(2000));
        assert!(valid_year(2100));
        assert!(!valid_year(1999));
        assert!(!valid_year(2101));
    }
}
