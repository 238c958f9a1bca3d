//! Display state: summary panel, schedule table, the two charts and the
//! comparison panel, always replaced as one unit.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rust_decimal::Decimal;
use shared::{
    domain::{ComparisonDiff, ComparisonResult, Schedule, ScheduleResult, Summary},
    protocol::ChartImages,
};
use tracing::{debug, warn};

use crate::{
    comparison::{build_breakdown, build_overlay},
    format::{format_money, DEFAULT_CURRENCY_SYMBOL},
    surface::{ChartDefinition, ChartSurface, SurfaceSlot},
    SurfaceError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Empty,
    OriginalShown,
    OriginalAndCustomShown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub payment_number: u32,
    pub date: String,
    pub payment: String,
    pub principal: String,
    pub interest: String,
    pub balance: String,
}

impl TableRow {
    pub const HEADERS: [&'static str; 6] =
        ["#", "Date", "Payment", "Principal", "Interest", "Balance"];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonPanel {
    Hidden,
    Savings {
        total_payments_diff: Decimal,
        months_diff: i64,
        text: String,
    },
    Rejected {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySnapshot {
    pub summary_lines: Vec<String>,
    pub table: Vec<TableRow>,
    pub balance_chart: ChartDefinition,
    pub breakdown_chart: ChartDefinition,
    pub comparison: ComparisonPanel,
}

impl DisplaySnapshot {
    pub fn shows_custom(&self) -> bool {
        matches!(&self.balance_chart, ChartDefinition::Line(overlay) if overlay.has_custom())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Validation,
    Rejection,
    Transport,
    Display,
    Export,
}

/// Transient error overlay. Never part of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

pub struct PresentationController {
    balance: SurfaceSlot,
    breakdown: SurfaceSlot,
    currency_symbol: String,
    default_currency_symbol: String,
    snapshot: Option<DisplaySnapshot>,
    /// Last original result that made it on screen; rejected custom
    /// requests redraw from it.
    original: Option<ScheduleResult>,
    alert: Option<Alert>,
    download_available: bool,
}

impl PresentationController {
    pub fn new(balance: Box<dyn ChartSurface>, breakdown: Box<dyn ChartSurface>) -> Self {
        Self::with_default_currency(balance, breakdown, DEFAULT_CURRENCY_SYMBOL)
    }

    pub fn with_default_currency(
        balance: Box<dyn ChartSurface>,
        breakdown: Box<dyn ChartSurface>,
        default_currency_symbol: impl Into<String>,
    ) -> Self {
        let default_currency_symbol = default_currency_symbol.into();
        Self {
            balance: SurfaceSlot::new(balance),
            breakdown: SurfaceSlot::new(breakdown),
            currency_symbol: default_currency_symbol.clone(),
            default_currency_symbol,
            snapshot: None,
            original: None,
            alert: None,
            download_available: false,
        }
    }

    /// A symbol sticks until a later response carries another one.
    pub fn set_currency(&mut self, symbol: Option<&str>) {
        if let Some(symbol) = symbol.map(str::trim).filter(|symbol| !symbol.is_empty()) {
            self.currency_symbol = symbol.to_string();
        }
    }

    pub fn currency_symbol(&self) -> &str {
        &self.currency_symbol
    }

    pub fn snapshot(&self) -> Option<&DisplaySnapshot> {
        self.snapshot.as_ref()
    }

    pub fn state(&self) -> DisplayState {
        match &self.snapshot {
            None => DisplayState::Empty,
            Some(snapshot) if snapshot.shows_custom() => DisplayState::OriginalAndCustomShown,
            Some(_) => DisplayState::OriginalShown,
        }
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn download_available(&self) -> bool {
        self.download_available
    }

    pub fn balance_surface(&self) -> &dyn ChartSurface {
        self.balance.surface()
    }

    pub fn breakdown_surface(&self) -> &dyn ChartSurface {
        self.breakdown.surface()
    }

    pub fn show_alert(&mut self, kind: AlertKind, message: impl Into<String>) {
        let message = message.into();
        debug!(?kind, %message, "alert shown");
        self.alert = Some(Alert { kind, message });
    }

    /// Back to the start-of-session state.
    pub fn reset(&mut self) -> Result<(), SurfaceError> {
        self.snapshot = None;
        self.original = None;
        self.alert = None;
        self.download_available = false;
        self.currency_symbol = self.default_currency_symbol.clone();
        self.balance.clear()?;
        self.breakdown.clear()
    }

    /// Replaces everything on screen with `result`. On a surface failure the
    /// previous snapshot stays current and its charts are rebound.
    pub fn render(&mut self, result: &ComparisonResult) -> Result<(), SurfaceError> {
        let next = self.build_snapshot(result);
        if let Err(err) = self.bind_charts(&next) {
            self.restore_bindings();
            return Err(err);
        }
        self.original = Some(result.original().clone());
        self.snapshot = Some(next);
        self.alert = None;
        self.download_available = true;
        Ok(())
    }

    /// The service declined the custom repayment: the comparison panel shows
    /// why and every view is redrawn from the last original only, in the
    /// current currency.
    pub fn render_custom_rejected(&mut self, message: impl Into<String>) -> Result<(), SurfaceError> {
        let message = message.into();
        let (Some(original), Some(current)) = (&self.original, &self.snapshot) else {
            warn!("custom repayment rejected with nothing on screen");
            self.show_alert(AlertKind::Rejection, message);
            return Ok(());
        };

        let mut next = self.build_snapshot(&ComparisonResult::OriginalOnly {
            original: original.clone(),
        });
        next.comparison = ComparisonPanel::Rejected {
            message: message.clone(),
        };
        let rebind_balance = next.balance_chart != current.balance_chart;
        let rebind_breakdown = next.breakdown_chart != current.breakdown_chart;
        if rebind_balance {
            if let Err(err) = self.balance.replace(&next.balance_chart) {
                self.restore_bindings();
                return Err(err);
            }
        }
        if rebind_breakdown {
            if let Err(err) = self.breakdown.replace(&next.breakdown_chart) {
                self.restore_bindings();
                return Err(err);
            }
        }
        self.snapshot = Some(next);
        self.alert = Some(Alert {
            kind: AlertKind::Rejection,
            message,
        });
        Ok(())
    }

    pub fn chart_images(&self) -> Result<ChartImages, SurfaceError> {
        Ok(ChartImages {
            balance_chart_b64: STANDARD.encode(self.balance.snapshot_png()?),
            breakdown_chart_b64: STANDARD.encode(self.breakdown.snapshot_png()?),
        })
    }

    fn bind_charts(&mut self, snapshot: &DisplaySnapshot) -> Result<(), SurfaceError> {
        self.balance.replace(&snapshot.balance_chart)?;
        self.breakdown.replace(&snapshot.breakdown_chart)?;
        Ok(())
    }

    fn restore_bindings(&mut self) {
        let restored = match self.snapshot.clone() {
            Some(previous) => self.bind_charts(&previous),
            None => self.balance.clear().and_then(|()| self.breakdown.clear()),
        };
        if let Err(err) = restored {
            warn!("failed to restore previous charts: {err}");
        }
    }

    fn build_snapshot(&self, result: &ComparisonResult) -> DisplaySnapshot {
        let original = result.original();
        let (custom, comparison) = match result {
            ComparisonResult::OriginalOnly { .. } => (None, ComparisonPanel::Hidden),
            ComparisonResult::WithCustom { custom, diff, .. } => {
                (Some(&custom.schedule), self.savings_panel(diff))
            }
        };
        DisplaySnapshot {
            summary_lines: self.summary_lines(&original.summary),
            table: self.table_rows(&original.schedule),
            balance_chart: ChartDefinition::Line(build_overlay(&original.schedule, custom)),
            breakdown_chart: ChartDefinition::StackedBar(build_breakdown(&original.schedule)),
            comparison,
        }
    }

    fn money(&self, amount: Decimal) -> String {
        format_money(&self.currency_symbol, amount)
    }

    fn summary_lines(&self, summary: &Summary) -> Vec<String> {
        vec![
            format!("Monthly Payment: {}", self.money(summary.monthly_payment)),
            format!("Total Payments: {}", self.money(summary.total_payments)),
            format!("Total Interest Paid: {}", self.money(summary.total_interest)),
            format!("Payoff Date: {}", summary.payoff_date.format("%Y-%m-%d")),
        ]
    }

    fn table_rows(&self, schedule: &Schedule) -> Vec<TableRow> {
        schedule
            .iter()
            .map(|record| TableRow {
                payment_number: record.payment_number,
                date: record.date.format("%Y-%m-%d").to_string(),
                payment: self.money(record.payment),
                principal: self.money(record.principal),
                interest: self.money(record.interest),
                balance: self.money(record.balance),
            })
            .collect()
    }

    fn savings_panel(&self, diff: &ComparisonDiff) -> ComparisonPanel {
        let text = format!(
            "You save {} and pay off {} months sooner.",
            self.money(diff.total_payments_diff),
            diff.months_diff,
        );
        ComparisonPanel::Savings {
            total_payments_diff: diff.total_payments_diff,
            months_diff: diff.months_diff,
            text,
        }
    }
}

#[cfg(test)]
#[path = "tests/presentation_tests.rs"]
mod tests;
