//! Payroll generation engine: roster/salary loader, monthly accrual
//! calculation, and the transactional writer with best-effort
//! notification dispatch.

pub mod calc;

use chrono::{NaiveDate, Weekday};
use sqlx::{Connection, MySqlConnection, MySqlPool};
use thiserror::Error;

use crate::model::advance_payment::AdvanceStatus;
use crate::model::attendance::AttendanceStatus;
use crate::notify::{Notifier, payslip_notice};
use self::calc::{
    AccrualInput, AdvanceDue, AttendanceDay, SalaryTerms, month_span, month_year_key, round2,
};

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("No employees found")]
    NoEmployees,
    #[error("Payroll generation already running for this period")]
    RunInProgress,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// One roster row: employee, owning account, and salary terms. The LEFT
/// JOIN in the loader coalesces missing profiles to zero.
#[derive(Debug, sqlx::FromRow)]
struct RosterEntry {
    employee_id: u64,
    user_id: u64,
    basic_salary: f64,
    allowance: f64,
    deduction_rate: f64,
}

/// Fully computed payroll row, rounded and ready to persist.
#[derive(Debug)]
struct ComputedRow {
    employee_id: u64,
    user_id: u64,
    basic_salary: f64,
    allowances: f64,
    deductions: f64,
    net_salary: f64,
    consumed_advance_ids: Vec<u64>,
}

#[derive(Debug)]
pub struct RunSummary {
    pub employees: usize,
    pub notified: usize,
}

fn run_lock_key(month: u32, year: i32) -> String {
    format!("ems_payroll_{}", month_year_key(month, year))
}

/// Generate payroll for every employee for `month/year`.
///
/// The whole run executes under a MySQL advisory lock keyed by the
/// period, so overlapping runs for the same month are rejected rather
/// than racing on advance-payment consumption. All payroll upserts and
/// advance settlements commit in a single transaction; notifications go
/// out only after the commit and never fail the run.
pub async fn generate(
    pool: &MySqlPool,
    notifier: &dyn Notifier,
    weekend: &[Weekday],
    month: u32,
    year: i32,
) -> Result<RunSummary, GenerateError> {
    let key = run_lock_key(month, year);
    let mut conn = pool.acquire().await?;

    let locked: i64 = sqlx::query_scalar("SELECT GET_LOCK(?, 0)")
        .bind(&key)
        .fetch_one(&mut *conn)
        .await?;
    if locked != 1 {
        return Err(GenerateError::RunInProgress);
    }

    let result = run_locked(&mut conn, weekend, month, year).await;

    // The pool will hand this connection to other requests; the advisory
    // lock must not travel with it.
    if let Err(e) = sqlx::query("SELECT RELEASE_LOCK(?)")
        .bind(&key)
        .execute(&mut *conn)
        .await
    {
        tracing::warn!(error = %e, key, "Failed to release payroll run lock");
    }
    drop(conn);

    let rows = result?;
    let notified = notify_all(notifier, &rows, month, year).await;

    Ok(RunSummary {
        employees: rows.len(),
        notified,
    })
}

async fn run_locked(
    conn: &mut MySqlConnection,
    weekend: &[Weekday],
    month: u32,
    year: i32,
) -> Result<Vec<ComputedRow>, GenerateError> {
    let roster = load_roster(&mut *conn).await?;
    if roster.is_empty() {
        return Err(GenerateError::NoEmployees);
    }

    let Some((month_start, month_end)) = month_span(year, month) else {
        // Callers validate the month; an invalid one simply has no rows.
        return Err(GenerateError::NoEmployees);
    };

    let mut rows = Vec::with_capacity(roster.len());
    for entry in &roster {
        let attendance = load_attendance(&mut *conn, entry.employee_id, month_start, month_end).await?;
        let leave_spans =
            load_approved_leave(&mut *conn, entry.employee_id, month_start, month_end).await?;
        let advances = load_unpaid_advances(&mut *conn, entry.employee_id).await?;

        let terms = SalaryTerms {
            basic_salary: entry.basic_salary,
            allowance: entry.allowance,
            deduction_rate: entry.deduction_rate,
        };
        let accrual = calc::accrue(
            year,
            month,
            weekend,
            &terms,
            AccrualInput {
                attendance: &attendance,
                leave_spans: &leave_spans,
                advances: &advances,
            },
        );

        tracing::debug!(
            employee_id = entry.employee_id,
            absent_days = accrual.absent_days,
            deductions = accrual.deductions,
            "Computed payroll accrual"
        );

        rows.push(ComputedRow {
            employee_id: entry.employee_id,
            user_id: entry.user_id,
            basic_salary: round2(entry.basic_salary),
            allowances: round2(entry.allowance),
            deductions: round2(accrual.deductions),
            net_salary: round2(accrual.net_salary),
            consumed_advance_ids: accrual.consumed_advance_ids,
        });
    }

    // One transaction for the whole period: a mid-run failure must not
    // leave some employees paid and others not.
    let mut tx = conn.begin().await?;
    let period = month_year_key(month, year);

    for row in &rows {
        sqlx::query(
            r#"
            INSERT INTO payroll
                (employee_id, month, year, basic_salary, allowances, deductions, net_salary, generated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, NOW())
            ON DUPLICATE KEY UPDATE
                basic_salary = VALUES(basic_salary),
                allowances = VALUES(allowances),
                deductions = VALUES(deductions),
                net_salary = VALUES(net_salary),
                generated_at = NOW()
            "#,
        )
        .bind(row.employee_id)
        .bind(month)
        .bind(year)
        .bind(row.basic_salary)
        .bind(row.allowances)
        .bind(row.deductions)
        .bind(row.net_salary)
        .execute(&mut *tx)
        .await?;

        for advance_id in &row.consumed_advance_ids {
            // The status guard keeps retries from double-deducting an
            // advance that an earlier run already settled.
            sqlx::query(
                r#"
                UPDATE advance_payments
                SET status = ?, paid_in_month = ?
                WHERE id = ? AND status = ?
                "#,
            )
            .bind(AdvanceStatus::Deducted.to_string())
            .bind(&period)
            .bind(advance_id)
            .bind(AdvanceStatus::Unpaid.to_string())
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    tracing::info!(month, year, employees = rows.len(), "Payroll run committed");

    Ok(rows)
}

async fn load_roster(conn: &mut MySqlConnection) -> sqlx::Result<Vec<RosterEntry>> {
    sqlx::query_as::<_, RosterEntry>(
        r#"
        SELECT
            e.id AS employee_id,
            e.user_id,
            COALESCE(es.basic_salary, 0) AS basic_salary,
            COALESCE(es.allowance, 0) AS allowance,
            COALESCE(es.deduction_rate, 0) AS deduction_rate
        FROM employees e
        LEFT JOIN employee_salary es ON es.employee_id = e.id
        "#,
    )
    .fetch_all(conn)
    .await
}

async fn load_attendance(
    conn: &mut MySqlConnection,
    employee_id: u64,
    month_start: NaiveDate,
    month_end: NaiveDate,
) -> sqlx::Result<Vec<AttendanceDay>> {
    let rows = sqlx::query_as::<_, (NaiveDate, String)>(
        r#"
        SELECT date, status
        FROM attendance
        WHERE employee_id = ? AND date BETWEEN ? AND ?
        "#,
    )
    .bind(employee_id)
    .bind(month_start)
    .bind(month_end)
    .fetch_all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(date, status)| AttendanceDay {
            date,
            // Unknown statuses still count as a recorded day.
            status: status
                .parse::<AttendanceStatus>()
                .unwrap_or(AttendanceStatus::Present),
        })
        .collect())
}

async fn load_approved_leave(
    conn: &mut MySqlConnection,
    employee_id: u64,
    month_start: NaiveDate,
    month_end: NaiveDate,
) -> sqlx::Result<Vec<(NaiveDate, NaiveDate)>> {
    sqlx::query_as::<_, (NaiveDate, NaiveDate)>(
        r#"
        SELECT start_date, end_date
        FROM leave_requests
        WHERE employee_id = ?
          AND status = ?
          AND start_date <= ?
          AND end_date >= ?
        "#,
    )
    .bind(employee_id)
    .bind(crate::model::leave_request::LeaveStatus::Approved.to_string())
    .bind(month_end)
    .bind(month_start)
    .fetch_all(conn)
    .await
}

async fn load_unpaid_advances(
    conn: &mut MySqlConnection,
    employee_id: u64,
) -> sqlx::Result<Vec<AdvanceDue>> {
    let rows = sqlx::query_as::<_, (u64, f64)>(
        r#"
        SELECT id, amount
        FROM advance_payments
        WHERE employee_id = ? AND status = ?
        "#,
    )
    .bind(employee_id)
    .bind(AdvanceStatus::Unpaid.to_string())
    .fetch_all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, amount)| AdvanceDue { id, amount })
        .collect())
}

/// Dispatch one payslip notification per employee. Failures are logged
/// and skipped; the payroll data is already committed at this point.
async fn notify_all(
    notifier: &dyn Notifier,
    rows: &[ComputedRow],
    month: u32,
    year: i32,
) -> usize {
    let mut notified = 0;
    for row in rows {
        let note = payslip_notice(row.user_id, row.employee_id, month, year);
        match notifier.send(note).await {
            Ok(()) => notified += 1,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    user_id = row.user_id,
                    "Failed to send payslip notification"
                );
            }
        }
    }
    notified
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::notification::NewNotification;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FlakyNotifier {
        fail_for_user: u64,
        sent: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl Notifier for FlakyNotifier {
        async fn send(&self, note: NewNotification) -> sqlx::Result<()> {
            if note.user_id == self.fail_for_user {
                return Err(sqlx::Error::RowNotFound);
            }
            self.sent.lock().unwrap().push(note.user_id);
            Ok(())
        }
    }

    fn row(employee_id: u64, user_id: u64) -> ComputedRow {
        ComputedRow {
            employee_id,
            user_id,
            basic_salary: 1000.0,
            allowances: 0.0,
            deductions: 0.0,
            net_salary: 1000.0,
            consumed_advance_ids: Vec::new(),
        }
    }

    #[actix_web::test]
    async fn a_failed_notification_does_not_stop_the_rest() {
        let notifier = FlakyNotifier {
            fail_for_user: 20,
            sent: Mutex::new(Vec::new()),
        };
        let rows = [row(1, 10), row(2, 20), row(3, 30)];

        let notified = notify_all(&notifier, &rows, 1, 2026).await;

        assert_eq!(notified, 2);
        assert_eq!(*notifier.sent.lock().unwrap(), vec![10, 30]);
    }

    #[test]
    fn lock_key_is_period_scoped() {
        assert_eq!(run_lock_key(1, 2026), "ems_payroll_01-2026");
        assert_ne!(run_lock_key(1, 2026), run_lock_key(2, 2026));
    }
}
