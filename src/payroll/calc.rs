use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::model::attendance::AttendanceStatus;

/// Compensation parameters for one employee, zero-valued when the
/// employee has no salary profile so downstream arithmetic stays total.
#[derive(Debug, Clone, Copy, Default)]
pub struct SalaryTerms {
    pub basic_salary: f64,
    pub allowance: f64,
    /// Percent of daily salary charged per unprotected absence day (0-100).
    pub deduction_rate: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct AttendanceDay {
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Copy)]
pub struct AdvanceDue {
    pub id: u64,
    pub amount: f64,
}

/// Month-scoped inputs for one employee, already fetched from storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccrualInput<'a> {
    pub attendance: &'a [AttendanceDay],
    /// Approved leave spans, inclusive on both ends.
    pub leave_spans: &'a [(NaiveDate, NaiveDate)],
    /// Unpaid advance payments to consume in this run.
    pub advances: &'a [AdvanceDue],
}

#[derive(Debug, Clone)]
pub struct Accrual {
    pub working_days: u32,
    pub absent_days: u32,
    pub attendance_deduction: f64,
    pub advance_total: f64,
    pub deductions: f64,
    pub net_salary: f64,
    pub consumed_advance_ids: Vec<u64>,
}

/// First and last calendar day of `month/year`, both inclusive.
pub fn month_span(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next.pred_opt()?))
}

/// Count of non-weekend calendar days in the month.
pub fn working_days(year: i32, month: u32, weekend: &[Weekday]) -> u32 {
    let Some((start, end)) = month_span(year, month) else {
        return 0;
    };
    let mut count = 0;
    let mut day = start;
    while day <= end {
        if !weekend.contains(&day.weekday()) {
            count += 1;
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    count
}

/// `"MM-YYYY"` period key used for advance settlement and payslip lookup.
pub fn month_year_key(month: u32, year: i32) -> String {
    format!("{month:02}-{year}")
}

/// Monetary values stay in floating precision internally and are rounded
/// only at the point of persistence/display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn expand_leave_spans(spans: &[(NaiveDate, NaiveDate)]) -> HashSet<NaiveDate> {
    let mut dates = HashSet::new();
    for &(start, end) in spans {
        let mut day = start;
        while day <= end {
            dates.insert(day);
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
    }
    dates
}

/// Derive one employee's deductions and net salary for the month.
///
/// Absence is counted from two sources on purpose: every explicit
/// `absent` attendance row counts once, and every working day with no
/// attendance row at all is an inferred absence unless an approved leave
/// span covers it. Weekend days never enter the count.
pub fn accrue(
    year: i32,
    month: u32,
    weekend: &[Weekday],
    terms: &SalaryTerms,
    input: AccrualInput<'_>,
) -> Accrual {
    let working_days = working_days(year, month, weekend);

    let leave_dates = expand_leave_spans(input.leave_spans);
    let attended: HashSet<NaiveDate> = input.attendance.iter().map(|a| a.date).collect();

    let mut absent_days = input
        .attendance
        .iter()
        .filter(|a| a.status == AttendanceStatus::Absent)
        .count() as u32;

    if let Some((start, end)) = month_span(year, month) {
        let mut day = start;
        while day <= end {
            if !weekend.contains(&day.weekday())
                && !attended.contains(&day)
                && !leave_dates.contains(&day)
            {
                absent_days += 1;
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
    }

    // All-weekend month: no daily salary, deductions reduce to advances.
    let daily_salary = if working_days == 0 {
        0.0
    } else {
        terms.basic_salary / working_days as f64
    };

    let attendance_deduction = terms.deduction_rate / 100.0 * daily_salary * absent_days as f64;
    let advance_total: f64 = input.advances.iter().map(|a| a.amount).sum();
    let deductions = attendance_deduction + advance_total;
    let net_salary = terms.basic_salary + terms.allowance - deductions;

    Accrual {
        working_days,
        absent_days,
        attendance_deduction,
        advance_total,
        deductions,
        net_salary,
        consumed_advance_ids: input.advances.iter().map(|a| a.id).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEKEND: [Weekday; 2] = [Weekday::Sat, Weekday::Sun];

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    /// Attendance rows for every working day of the month, `absent` for
    /// the listed dates and `present` otherwise.
    fn full_month_attendance(year: i32, month: u32, absent_on: &[NaiveDate]) -> Vec<AttendanceDay> {
        let (start, end) = month_span(year, month).unwrap();
        let mut rows = Vec::new();
        let mut day = start;
        while day <= end {
            if !WEEKEND.contains(&day.weekday()) {
                let status = if absent_on.contains(&day) {
                    AttendanceStatus::Absent
                } else {
                    AttendanceStatus::Present
                };
                rows.push(AttendanceDay { date: day, status });
            }
            day = day.succ_opt().unwrap();
        }
        rows
    }

    #[test]
    fn working_days_january_2026_is_22() {
        assert_eq!(working_days(2026, 1, &WEEKEND), 22);
    }

    #[test]
    fn working_days_february_2026_is_20() {
        assert_eq!(working_days(2026, 2, &WEEKEND), 20);
    }

    #[test]
    fn working_days_counts_everything_without_weekend() {
        assert_eq!(working_days(2026, 1, &[]), 31);
    }

    #[test]
    fn month_span_handles_december() {
        let (start, end) = month_span(2026, 12).unwrap();
        assert_eq!(start, date(2026, 12, 1));
        assert_eq!(end, date(2026, 12, 31));
    }

    #[test]
    fn month_span_rejects_invalid_month() {
        assert!(month_span(2026, 13).is_none());
    }

    #[test]
    fn month_year_key_pads_month() {
        assert_eq!(month_year_key(3, 2026), "03-2026");
        assert_eq!(month_year_key(12, 2026), "12-2026");
    }

    #[test]
    fn two_explicit_absences_prorate_the_deduction() {
        // 30000 basic / 22 working days, 10% per absent day, 2 absences.
        let terms = SalaryTerms {
            basic_salary: 30000.0,
            allowance: 2000.0,
            deduction_rate: 10.0,
        };
        let attendance =
            full_month_attendance(2026, 1, &[date(2026, 1, 5), date(2026, 1, 6)]);
        let accrual = accrue(
            2026,
            1,
            &WEEKEND,
            &terms,
            AccrualInput {
                attendance: &attendance,
                ..Default::default()
            },
        );

        assert_eq!(accrual.working_days, 22);
        assert_eq!(accrual.absent_days, 2);
        assert_eq!(round2(accrual.attendance_deduction), 272.73);
        assert_eq!(round2(accrual.net_salary), 31727.27);
    }

    #[test]
    fn approved_leave_shields_uncovered_days() {
        let terms = SalaryTerms {
            basic_salary: 30000.0,
            allowance: 2000.0,
            deduction_rate: 10.0,
        };
        // Rows for everything except Mon Jan 5 .. Fri Jan 9, which a
        // five-day approved leave covers instead.
        let mut attendance = full_month_attendance(2026, 1, &[]);
        attendance.retain(|a| a.date < date(2026, 1, 5) || a.date > date(2026, 1, 9));
        let leave_spans = [(date(2026, 1, 5), date(2026, 1, 9))];

        let accrual = accrue(
            2026,
            1,
            &WEEKEND,
            &terms,
            AccrualInput {
                attendance: &attendance,
                leave_spans: &leave_spans,
                ..Default::default()
            },
        );

        assert_eq!(accrual.absent_days, 0);
        assert_eq!(accrual.attendance_deduction, 0.0);
        assert_eq!(accrual.net_salary, 32000.0);
    }

    #[test]
    fn unpaid_advances_are_consumed_in_full() {
        let terms = SalaryTerms {
            basic_salary: 30000.0,
            allowance: 2000.0,
            deduction_rate: 10.0,
        };
        let attendance = full_month_attendance(2026, 1, &[]);
        let advances = [AdvanceDue {
            id: 7,
            amount: 5000.0,
        }];

        let accrual = accrue(
            2026,
            1,
            &WEEKEND,
            &terms,
            AccrualInput {
                attendance: &attendance,
                advances: &advances,
                ..Default::default()
            },
        );

        assert_eq!(accrual.attendance_deduction, 0.0);
        assert_eq!(accrual.deductions, 5000.0);
        assert_eq!(accrual.net_salary, 27000.0);
        assert_eq!(accrual.consumed_advance_ids, vec![7]);
    }

    #[test]
    fn no_records_at_all_means_fully_absent() {
        let terms = SalaryTerms {
            basic_salary: 22000.0,
            allowance: 0.0,
            deduction_rate: 100.0,
        };
        let accrual = accrue(2026, 1, &WEEKEND, &terms, AccrualInput::default());

        assert_eq!(accrual.absent_days, 22);
        // 100% of the daily salary for every working day wipes the basic.
        assert_eq!(round2(accrual.attendance_deduction), 22000.0);
        assert_eq!(round2(accrual.net_salary), 0.0);
    }

    #[test]
    fn missing_salary_profile_still_deducts_advances() {
        // Observed upstream behavior: advances deduct from a zero salary,
        // driving the net negative.
        let advances = [AdvanceDue {
            id: 1,
            amount: 3000.0,
        }];
        let accrual = accrue(
            2026,
            1,
            &WEEKEND,
            &SalaryTerms::default(),
            AccrualInput {
                advances: &advances,
                ..Default::default()
            },
        );

        assert_eq!(accrual.deductions, 3000.0);
        assert_eq!(accrual.net_salary, -3000.0);
    }

    #[test]
    fn zero_working_days_does_not_divide() {
        // Hypothetical month where every day is a weekend.
        let all_days = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ];
        let terms = SalaryTerms {
            basic_salary: 30000.0,
            allowance: 0.0,
            deduction_rate: 10.0,
        };
        let advances = [AdvanceDue {
            id: 9,
            amount: 1200.0,
        }];
        let accrual = accrue(
            2026,
            1,
            &all_days,
            &terms,
            AccrualInput {
                advances: &advances,
                ..Default::default()
            },
        );

        assert_eq!(accrual.working_days, 0);
        assert_eq!(accrual.attendance_deduction, 0.0);
        assert_eq!(accrual.deductions, 1200.0);
    }

    #[test]
    fn net_salary_round_trips_against_its_parts() {
        let terms = SalaryTerms {
            basic_salary: 41999.99,
            allowance: 1500.5,
            deduction_rate: 37.5,
        };
        let attendance = full_month_attendance(2026, 2, &[date(2026, 2, 3)]);
        let advances = [AdvanceDue {
            id: 2,
            amount: 750.25,
        }];
        let accrual = accrue(
            2026,
            2,
            &WEEKEND,
            &terms,
            AccrualInput {
                attendance: &attendance,
                advances: &advances,
                ..Default::default()
            },
        );

        let expected = terms.basic_salary + terms.allowance - accrual.deductions;
        assert_eq!(accrual.net_salary, expected);
    }

    #[test]
    fn every_day_of_the_month_lands_in_exactly_one_bucket() {
        let (start, end) = month_span(2026, 1).unwrap();
        let leave_spans = [(date(2026, 1, 12), date(2026, 1, 14))];
        let attendance = [
            AttendanceDay {
                date: date(2026, 1, 5),
                status: AttendanceStatus::Present,
            },
            AttendanceDay {
                date: date(2026, 1, 6),
                status: AttendanceStatus::Absent,
            },
        ];
        let leave_dates = expand_leave_spans(&leave_spans);
        let attended: HashSet<NaiveDate> = attendance.iter().map(|a| a.date).collect();

        let mut weekend_days = 0u32;
        let mut explicit = 0u32;
        let mut on_leave = 0u32;
        let mut inferred = 0u32;
        let mut day = start;
        while day <= end {
            if WEEKEND.contains(&day.weekday()) {
                weekend_days += 1;
            } else if attended.contains(&day) {
                explicit += 1;
            } else if leave_dates.contains(&day) {
                on_leave += 1;
            } else {
                inferred += 1;
            }
            day = day.succ_opt().unwrap();
        }

        assert_eq!(weekend_days + explicit + on_leave + inferred, 31);

        let terms = SalaryTerms {
            basic_salary: 31000.0,
            allowance: 0.0,
            deduction_rate: 50.0,
        };
        let accrual = accrue(
            2026,
            1,
            &WEEKEND,
            &terms,
            AccrualInput {
                attendance: &attendance,
                leave_spans: &leave_spans,
                ..Default::default()
            },
        );
        // One explicit absence plus every uncovered working day.
        assert_eq!(accrual.absent_days, 1 + inferred);
    }

    #[test]
    fn deduction_formula_is_month_independent() {
        let terms = SalaryTerms {
            basic_salary: 26000.0,
            allowance: 0.0,
            deduction_rate: 20.0,
        };
        for (year, month) in [(2026, 1), (2026, 2), (2025, 6), (2024, 2)] {
            let attendance = full_month_attendance(year, month, &[]);
            let mut with_absence = attendance.clone();
            with_absence[0].status = AttendanceStatus::Absent;

            let accrual = accrue(
                year,
                month,
                &WEEKEND,
                &terms,
                AccrualInput {
                    attendance: &with_absence,
                    ..Default::default()
                },
            );
            let wd = working_days(year, month, &WEEKEND) as f64;
            let expected = 0.2 * (26000.0 / wd);
            assert!((accrual.attendance_deduction - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn leave_expansion_is_inclusive_on_both_ends() {
        let dates = expand_leave_spans(&[(date(2026, 1, 10), date(2026, 1, 12))]);
        assert_eq!(dates.len(), 3);
        assert!(dates.contains(&date(2026, 1, 10)));
        assert!(dates.contains(&date(2026, 1, 12)));
    }

    #[test]
    fn round2_half_up() {
        assert_eq!(round2(272.727272), 272.73);
        assert_eq!(round2(31727.2727), 31727.27);
        assert_eq!(round2(-123.456), -123.46);
    }
}
