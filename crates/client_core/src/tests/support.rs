//! Fixture schedules shaped like the calculation service's output.

use chrono::{Days, NaiveDate};
use rust_decimal::{
    prelude::{FromPrimitive, ToPrimitive},
    Decimal,
};
use rust_decimal_macros::dec;
use shared::domain::{
    ComparisonDiff, ComparisonResult, LoanParameters, PaymentRecord, Schedule, ScheduleResult,
    Summary,
};

use crate::comparison::round_minor;

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).expect("date")
}

pub fn sample_params() -> LoanParameters {
    LoanParameters {
        purchase_price: dec!(250000),
        interest_rate: dec!(6),
        down_payment: dec!(50000),
        loan_term: 30,
        start_date: start_date(),
    }
}

/// Level monthly payment for `principal` over `months` at `annual_rate` percent,
/// rounded up to the next cent.
pub fn level_payment(principal: Decimal, annual_rate: Decimal, months: u32) -> Decimal {
    let principal = principal.to_f64().expect("principal");
    let rate = annual_rate.to_f64().expect("rate") / 100.0 / 12.0;
    let payment = if rate == 0.0 {
        principal / months as f64
    } else {
        principal * rate / (1.0 - (1.0 + rate).powi(-(months as i32)))
    };
    Decimal::from_f64(payment)
        .expect("payment")
        .round_dp_with_strategy(2, rust_decimal::RoundingStrategy::AwayFromZero)
}

pub fn amortize(
    principal: Decimal,
    annual_rate: Decimal,
    months: u32,
    payment: Decimal,
) -> ScheduleResult {
    let monthly_rate = annual_rate / dec!(1200);
    let mut balance = principal;
    let mut records = Vec::new();
    let mut number = 1u32;
    while balance > Decimal::ZERO {
        let interest = round_minor(balance * monthly_rate);
        let principal_paid = if number == months || payment - interest >= balance {
            balance
        } else {
            payment - interest
        };
        balance -= principal_paid;
        records.push(PaymentRecord {
            payment_number: number,
            date: start_date() + Days::new(30 * u64::from(number - 1)),
            payment: principal_paid + interest,
            principal: principal_paid,
            interest,
            balance,
        });
        number += 1;
    }

    let total_payments: Decimal = records.iter().map(|r| r.payment).sum();
    let total_interest: Decimal = records.iter().map(|r| r.interest).sum();
    let payoff_date = records.last().expect("at least one payment").date;
    ScheduleResult {
        summary: Summary {
            monthly_payment: payment,
            total_payments,
            total_interest,
            payoff_date,
        },
        schedule: Schedule::try_from(records).expect("fixture schedule"),
    }
}

pub fn original_result() -> ScheduleResult {
    let payment = level_payment(dec!(200000), dec!(6), 360);
    amortize(dec!(200000), dec!(6), 360, payment)
}

pub fn custom_result(custom_payment: Decimal) -> ScheduleResult {
    amortize(dec!(200000), dec!(6), 360, custom_payment)
}

pub fn comparison_parts(custom_payment: Decimal) -> (ScheduleResult, ScheduleResult, ComparisonDiff) {
    let original = original_result();
    let custom = custom_result(custom_payment);
    let diff = ComparisonDiff {
        total_payments_diff: round_minor(
            original.summary.total_payments - custom.summary.total_payments,
        ),
        months_diff: original.schedule.len() as i64 - custom.schedule.len() as i64,
    };
    (original, custom, diff)
}

pub fn comparison(custom_payment: Decimal) -> ComparisonResult {
    let (original, custom, diff) = comparison_parts(custom_payment);
    ComparisonResult::WithCustom {
        original,
        custom,
        diff,
    }
}

/// Small hand-checked schedule.
pub fn short_schedule() -> Schedule {
    let record = |n: u32, principal: Decimal, interest: Decimal, balance: Decimal| PaymentRecord {
        payment_number: n,
        date: start_date() + Days::new(30 * u64::from(n - 1)),
        payment: principal + interest,
        principal,
        interest,
        balance,
    };
    Schedule::try_from(vec![
        record(1, dec!(330.00), dec!(10.005), dec!(670.00)),
        record(2, dec!(333.30), dec!(6.70), dec!(336.70)),
        record(3, dec!(336.70), dec!(3.365), dec!(0.00)),
    ])
    .expect("short schedule")
}
