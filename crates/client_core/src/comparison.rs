//! Chart series derived from one or two schedules.
//!
//! Scalar comparison numbers (`total_payments_diff`, `months_diff`) are not
//! derived here; they come from the calculation service untouched.

use rust_decimal::{Decimal, RoundingStrategy};
use shared::domain::Schedule;

pub const MINOR_UNIT_DECIMALS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLUE: Rgb = Rgb(30, 90, 220);
    pub const ORANGE: Rgb = Rgb(235, 140, 20);
    pub const PURPLE: Rgb = Rgb(140, 60, 200);
    pub const CRIMSON: Rgb = Rgb(200, 30, 60);
    pub const GREEN: Rgb = Rgb(40, 160, 70);
    pub const RED: Rgb = Rgb(215, 45, 45);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesStyle {
    pub color: Rgb,
    pub dashed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartPoint {
    pub payment_number: u32,
    pub value: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    OriginalBalance,
    OriginalCumulativeInterest,
    CustomBalance,
    CustomCumulativeInterest,
}

impl SeriesKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::OriginalBalance => "Remaining Balance",
            Self::OriginalCumulativeInterest => "Cumulative Interest",
            Self::CustomBalance => "Remaining Balance (custom)",
            Self::CustomCumulativeInterest => "Cumulative Interest (custom)",
        }
    }

    pub fn style(self) -> SeriesStyle {
        match self {
            Self::OriginalBalance => SeriesStyle {
                color: Rgb::BLUE,
                dashed: false,
            },
            Self::OriginalCumulativeInterest => SeriesStyle {
                color: Rgb::ORANGE,
                dashed: false,
            },
            Self::CustomBalance => SeriesStyle {
                color: Rgb::PURPLE,
                dashed: true,
            },
            Self::CustomCumulativeInterest => SeriesStyle {
                color: Rgb::CRIMSON,
                dashed: true,
            },
        }
    }

    pub fn is_custom(self) -> bool {
        matches!(self, Self::CustomBalance | Self::CustomCumulativeInterest)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub kind: SeriesKind,
    pub points: Vec<ChartPoint>,
}

impl Series {
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    pub fn style(&self) -> SeriesStyle {
        self.kind.style()
    }
}

/// Balance and cumulative-interest lines for the balance chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlaySeries {
    pub series: Vec<Series>,
}

impl OverlaySeries {
    pub fn has_custom(&self) -> bool {
        self.series.iter().any(|series| series.kind.is_custom())
    }

    pub fn get(&self, kind: SeriesKind) -> Option<&Series> {
        self.series.iter().find(|series| series.kind == kind)
    }
}

/// Per-period principal and interest bars for the breakdown chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakdownSeries {
    pub payment_numbers: Vec<u32>,
    pub principal: Vec<Decimal>,
    pub interest: Vec<Decimal>,
}

impl BreakdownSeries {
    pub const PRINCIPAL_STYLE: SeriesStyle = SeriesStyle {
        color: Rgb::GREEN,
        dashed: false,
    };
    pub const INTEREST_STYLE: SeriesStyle = SeriesStyle {
        color: Rgb::RED,
        dashed: false,
    };
    pub const PRINCIPAL_LABEL: &'static str = "Principal";
    pub const INTEREST_LABEL: &'static str = "Interest";

    pub fn len(&self) -> usize {
        self.payment_numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payment_numbers.is_empty()
    }
}

pub fn round_minor(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MINOR_UNIT_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// Running interest total; each element is rounded on its own so the
/// series matches the per-point values shown on the chart.
pub fn cumulative_interest(schedule: &Schedule) -> Vec<Decimal> {
    let mut running = Decimal::ZERO;
    schedule
        .iter()
        .map(|record| {
            running += record.interest;
            round_minor(running)
        })
        .collect()
}

fn balance_series(kind: SeriesKind, schedule: &Schedule) -> Series {
    Series {
        kind,
        points: schedule
            .iter()
            .map(|record| ChartPoint {
                payment_number: record.payment_number,
                value: record.balance,
            })
            .collect(),
    }
}

fn interest_series(kind: SeriesKind, schedule: &Schedule) -> Series {
    Series {
        kind,
        points: schedule
            .iter()
            .zip(cumulative_interest(schedule))
            .map(|(record, value)| ChartPoint {
                payment_number: record.payment_number,
                value,
            })
            .collect(),
    }
}

/// Each schedule keeps its own payment-number axis; a shorter custom
/// schedule simply ends earlier.
pub fn build_overlay(original: &Schedule, custom: Option<&Schedule>) -> OverlaySeries {
    let mut series = vec![
        balance_series(SeriesKind::OriginalBalance, original),
        interest_series(SeriesKind::OriginalCumulativeInterest, original),
    ];
    if let Some(custom) = custom {
        series.push(balance_series(SeriesKind::CustomBalance, custom));
        series.push(interest_series(SeriesKind::CustomCumulativeInterest, custom));
    }
    OverlaySeries { series }
}

pub fn build_breakdown(original: &Schedule) -> BreakdownSeries {
    let mut breakdown = BreakdownSeries {
        payment_numbers: Vec::with_capacity(original.len()),
        principal: Vec::with_capacity(original.len()),
        interest: Vec::with_capacity(original.len()),
    };
    for record in original {
        breakdown.payment_numbers.push(record.payment_number);
        breakdown.principal.push(record.principal);
        breakdown.interest.push(record.interest);
    }
    breakdown
}

#[cfg(test)]
#[path = "tests/comparison_tests.rs"]
mod tests;
