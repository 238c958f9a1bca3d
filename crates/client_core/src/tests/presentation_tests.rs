use std::sync::{Arc, Mutex};

use rust_decimal_macros::dec;
use shared::domain::ComparisonResult;

use super::*;
use crate::surface::{BindingId, RasterSurface};
use crate::test_support::{comparison, original_result};

#[derive(Default)]
struct SurfaceLog {
    active: Vec<BindingId>,
    binds: u64,
    releases: u64,
    fail_next_bind: bool,
    last_chart: Option<ChartDefinition>,
}

/// Surface that records its bindings so tests can inspect them after the
/// controller has taken ownership.
struct RecordingSurface {
    name: &'static str,
    log: Arc<Mutex<SurfaceLog>>,
}

impl RecordingSurface {
    fn new(name: &'static str) -> (Self, Arc<Mutex<SurfaceLog>>) {
        let log = Arc::new(Mutex::new(SurfaceLog::default()));
        (
            Self {
                name,
                log: Arc::clone(&log),
            },
            log,
        )
    }
}

impl ChartSurface for RecordingSurface {
    fn name(&self) -> &str {
        self.name
    }

    fn bind(&mut self, chart: &ChartDefinition) -> Result<BindingId, SurfaceError> {
        let mut log = self.log.lock().expect("log");
        if log.fail_next_bind {
            log.fail_next_bind = false;
            return Err(SurfaceError::Encode {
                surface: self.name.to_string(),
                reason: "canvas lost".into(),
            });
        }
        if !log.active.is_empty() {
            return Err(SurfaceError::AlreadyBound {
                surface: self.name.to_string(),
            });
        }
        log.binds += 1;
        let binding = BindingId(log.binds);
        log.active.push(binding);
        log.last_chart = Some(chart.clone());
        Ok(binding)
    }

    fn release(&mut self, binding: BindingId) -> Result<(), SurfaceError> {
        let mut log = self.log.lock().expect("log");
        let before = log.active.len();
        log.active.retain(|active| *active != binding);
        if log.active.len() == before {
            return Err(SurfaceError::UnknownBinding {
                surface: self.name.to_string(),
                binding: binding.0,
            });
        }
        log.releases += 1;
        Ok(())
    }

    fn active_bindings(&self) -> usize {
        self.log.lock().expect("log").active.len()
    }

    fn snapshot_png(&self) -> Result<Vec<u8>, SurfaceError> {
        Ok(format!("png:{}", self.name).into_bytes())
    }
}

struct Harness {
    controller: PresentationController,
    balance: Arc<Mutex<SurfaceLog>>,
    breakdown: Arc<Mutex<SurfaceLog>>,
}

fn harness() -> Harness {
    let (balance_surface, balance) = RecordingSurface::new("balance");
    let (breakdown_surface, breakdown) = RecordingSurface::new("breakdown");
    Harness {
        controller: PresentationController::new(
            Box::new(balance_surface),
            Box::new(breakdown_surface),
        ),
        balance,
        breakdown,
    }
}

fn original_only() -> ComparisonResult {
    ComparisonResult::OriginalOnly {
        original: original_result(),
    }
}

#[test]
fn starts_empty_with_download_hidden() {
    let h = harness();
    assert_eq!(h.controller.state(), DisplayState::Empty);
    assert!(!h.controller.download_available());
    assert!(h.controller.snapshot().is_none());
    assert_eq!(h.controller.currency_symbol(), "$");
}

#[test]
fn renders_original_schedule_into_every_view() {
    let mut h = harness();
    h.controller.render(&original_only()).expect("render");

    let snapshot = h.controller.snapshot().expect("snapshot");
    assert_eq!(snapshot.table.len(), 360);
    assert_eq!(snapshot.table[0].payment_number, 1);
    assert_eq!(snapshot.table[359].balance, "$0.00");
    assert_eq!(snapshot.summary_lines[0], "Monthly Payment: $1,199.11");
    assert!(snapshot.summary_lines[3].starts_with("Payoff Date: "));
    assert_eq!(snapshot.comparison, ComparisonPanel::Hidden);
    assert_eq!(h.controller.state(), DisplayState::OriginalShown);
    assert!(h.controller.download_available());
    assert!(matches!(
        h.balance.lock().expect("log").last_chart,
        Some(ChartDefinition::Line(_))
    ));
    assert!(matches!(
        h.breakdown.lock().expect("log").last_chart,
        Some(ChartDefinition::StackedBar(_))
    ));
}

#[test]
fn repeated_renders_leave_one_binding_per_surface() {
    let mut h = harness();
    h.controller.render(&original_only()).expect("first");
    assert_eq!(h.controller.balance_surface().active_bindings(), 1);
    assert_eq!(h.controller.breakdown_surface().active_bindings(), 1);

    h.controller.render(&comparison(dec!(1800))).expect("second");
    assert_eq!(h.controller.balance_surface().active_bindings(), 1);
    assert_eq!(h.controller.breakdown_surface().active_bindings(), 1);

    let balance = h.balance.lock().expect("log");
    assert_eq!(balance.binds, 2);
    assert_eq!(balance.releases, 1);
}

#[test]
fn comparison_render_overlays_custom_and_shows_savings() {
    let mut h = harness();
    let result = comparison(dec!(1800));
    h.controller.render(&result).expect("render");

    assert_eq!(h.controller.state(), DisplayState::OriginalAndCustomShown);
    let snapshot = h.controller.snapshot().expect("snapshot");
    match &snapshot.comparison {
        ComparisonPanel::Savings {
            months_diff, text, ..
        } => {
            assert!(*months_diff > 0);
            assert!(text.starts_with("You save $"), "{text}");
            assert!(
                text.ends_with(&format!("pay off {months_diff} months sooner.")),
                "{text}"
            );
        }
        other => panic!("unexpected panel: {other:?}"),
    }
    match &snapshot.breakdown_chart {
        ChartDefinition::StackedBar(breakdown) => assert_eq!(breakdown.len(), 360),
        other => panic!("unexpected chart: {other:?}"),
    }
}

#[test]
fn custom_rejection_keeps_original_views_and_drops_overlay() {
    let mut h = harness();
    h.controller.render(&comparison(dec!(1800))).expect("render");
    let before = h.controller.snapshot().cloned().expect("snapshot");

    h.controller
        .render_custom_rejected("custom repayment too low")
        .expect("rejection");

    let after = h.controller.snapshot().expect("snapshot");
    assert_eq!(after.summary_lines, before.summary_lines);
    assert_eq!(after.table, before.table);
    assert_eq!(after.breakdown_chart, before.breakdown_chart);
    assert!(!after.shows_custom());
    assert_eq!(
        after.comparison,
        ComparisonPanel::Rejected {
            message: "custom repayment too low".into()
        }
    );
    assert_eq!(h.controller.state(), DisplayState::OriginalShown);
    assert_eq!(
        h.controller.alert().map(|alert| alert.kind),
        Some(AlertKind::Rejection)
    );
    assert_eq!(h.controller.balance_surface().active_bindings(), 1);
    assert_eq!(h.breakdown.lock().expect("log").binds, 1);
}

#[test]
fn rejection_redraws_text_in_the_current_currency() {
    let mut h = harness();
    h.controller.render(&comparison(dec!(1800))).expect("render");
    h.controller.set_currency(Some("€"));
    h.controller
        .render_custom_rejected("custom repayment too low")
        .expect("rejection");

    let snapshot = h.controller.snapshot().expect("snapshot");
    assert_eq!(snapshot.summary_lines[0], "Monthly Payment: €1,199.11");
    assert!(snapshot
        .table
        .iter()
        .all(|row| row.payment.starts_with('€') && row.balance.starts_with('€')));
    assert_eq!(h.breakdown.lock().expect("log").binds, 1);
}

#[test]
fn rejection_after_original_only_does_not_rebind() {
    let mut h = harness();
    h.controller.render(&original_only()).expect("render");
    h.controller
        .render_custom_rejected("too low")
        .expect("rejection");
    assert_eq!(h.balance.lock().expect("log").binds, 1);
}

#[test]
fn currency_symbol_sticks_until_overridden() {
    let mut h = harness();
    h.controller.set_currency(Some("€"));
    h.controller.render(&original_only()).expect("render");
    assert!(h.controller.snapshot().expect("snapshot").summary_lines[0].contains("€1,199.11"));

    h.controller.set_currency(None);
    h.controller.render(&original_only()).expect("render");
    assert!(h.controller.snapshot().expect("snapshot").table[0]
        .payment
        .starts_with('€'));

    h.controller.set_currency(Some("£"));
    h.controller.render(&original_only()).expect("render");
    assert!(h.controller.snapshot().expect("snapshot").table[0]
        .payment
        .starts_with('£'));
}

#[test]
fn failed_bind_keeps_previous_snapshot_and_rebinds_it() {
    let mut h = harness();
    h.controller.render(&original_only()).expect("render");
    let before = h.controller.snapshot().cloned().expect("snapshot");

    h.breakdown.lock().expect("log").fail_next_bind = true;
    let err = h
        .controller
        .render(&comparison(dec!(1800)))
        .expect_err("bind failure");
    assert!(matches!(err, SurfaceError::Encode { .. }));

    assert_eq!(h.controller.snapshot(), Some(&before));
    assert_eq!(h.controller.state(), DisplayState::OriginalShown);
    assert_eq!(h.controller.balance_surface().active_bindings(), 1);
    assert_eq!(h.controller.breakdown_surface().active_bindings(), 1);
    assert!(matches!(
        &h.balance.lock().expect("log").last_chart,
        Some(ChartDefinition::Line(overlay)) if !overlay.has_custom()
    ));
}

#[test]
fn alerts_clear_on_next_successful_render() {
    let mut h = harness();
    h.controller.show_alert(AlertKind::Transport, "service unavailable");
    assert_eq!(
        h.controller.alert().map(|alert| alert.kind),
        Some(AlertKind::Transport)
    );
    assert!(h.controller.snapshot().is_none());

    h.controller.render(&original_only()).expect("render");
    assert!(h.controller.alert().is_none());
}

#[test]
fn reset_releases_charts_and_hides_download() {
    let mut h = harness();
    h.controller.set_currency(Some("€"));
    h.controller.render(&original_only()).expect("render");
    h.controller.reset().expect("reset");

    assert_eq!(h.controller.state(), DisplayState::Empty);
    assert!(!h.controller.download_available());
    assert_eq!(h.controller.currency_symbol(), "$");
    assert_eq!(h.controller.balance_surface().active_bindings(), 0);
    assert_eq!(h.controller.breakdown_surface().active_bindings(), 0);
}

#[test]
fn dropping_controller_releases_bindings() {
    let mut h = harness();
    h.controller.render(&original_only()).expect("render");
    let balance = Arc::clone(&h.balance);
    drop(h);
    assert!(balance.lock().expect("log").active.is_empty());
}

#[test]
fn chart_images_are_base64_snapshots_of_both_surfaces() {
    let mut h = harness();
    assert!(h.controller.chart_images().is_err());
    h.controller.render(&original_only()).expect("render");
    let images = h.controller.chart_images().expect("images");
    assert_eq!(images.balance_chart_b64, STANDARD.encode("png:balance"));
    assert_eq!(images.breakdown_chart_b64, STANDARD.encode("png:breakdown"));
}

#[test]
fn raster_surfaces_produce_exportable_pngs() {
    let mut controller = PresentationController::new(
        Box::new(RasterSurface::new("balance", 480, 280)),
        Box::new(RasterSurface::new("breakdown", 480, 280)),
    );
    controller.render(&comparison(dec!(1800))).expect("render");
    let images = controller.chart_images().expect("images");
    let png = STANDARD.decode(images.balance_chart_b64).expect("base64");
    assert_eq!(&png[..4], b"\x89PNG");
}
