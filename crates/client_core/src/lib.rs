use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use rust_decimal::Decimal;
use shared::{
    domain::{ComparisonResult, CustomRepayment, LoanParameters, LoanRequest},
    error::ValidationError,
    protocol::CalculateResponse,
};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

pub mod comparison;
pub mod error;
pub mod format;
pub mod presentation;
pub mod session;
pub mod surface;
pub mod transport;

pub use error::{ClientError, SurfaceError, TransportError};
pub use presentation::{
    Alert, AlertKind, ComparisonPanel, DisplaySnapshot, DisplayState, PresentationController,
    TableRow,
};
pub use surface::{ChartDefinition, ChartSurface, RasterSurface};
pub use transport::{HttpLoanServices, LoanServices};

use crate::{
    format::format_money,
    session::{RequestSequencer, SessionMemory},
};

/// Name the exported report is saved under inside the download directory.
pub const REPORT_FILENAME: &str = "amortization_schedule.xlsx";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Applied(DisplayState),
    /// A request issued later already updated the display.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub size_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    SubmitOriginal,
    SubmitCustom,
    Export,
}

impl Action {
    fn name(self) -> &'static str {
        match self {
            Self::SubmitOriginal => "submit_original",
            Self::SubmitCustom => "submit_custom",
            Self::Export => "export_report",
        }
    }
}

struct ClientState {
    session: SessionMemory,
    sequencer: RequestSequencer,
    presenter: PresentationController,
}

/// Drives calculation, custom comparison and export against the loan
/// services and keeps the presentation in step with what was accepted.
///
/// The state lock is never held across a service call.
pub struct AmortizationClient {
    services: Arc<dyn LoanServices>,
    download_dir: PathBuf,
    inner: Mutex<ClientState>,
}

impl AmortizationClient {
    pub fn new(
        services: Arc<dyn LoanServices>,
        presenter: PresentationController,
        download_dir: impl Into<PathBuf>,
    ) -> Arc<Self> {
        Arc::new(Self {
            services,
            download_dir: download_dir.into(),
            inner: Mutex::new(ClientState {
                session: SessionMemory::default(),
                sequencer: RequestSequencer::default(),
                presenter,
            }),
        })
    }

    /// Read access to the current display for whatever draws it.
    pub async fn with_presenter<R>(&self, read: impl FnOnce(&PresentationController) -> R) -> R {
        let guard = self.inner.lock().await;
        read(&guard.presenter)
    }

    pub async fn display_state(&self) -> DisplayState {
        self.inner.lock().await.presenter.state()
    }

    pub async fn last_submitted(&self) -> Option<LoanParameters> {
        self.inner.lock().await.session.base().cloned()
    }

    /// Start a fresh session: forget the last submission and clear the display.
    /// Responses to requests issued before the reset are discarded.
    pub async fn reset(&self) -> Result<(), ClientError> {
        let mut guard = self.inner.lock().await;
        guard.sequencer.invalidate();
        guard.session = SessionMemory::default();
        guard.presenter.reset()?;
        Ok(())
    }

    pub async fn submit_original(
        &self,
        params: LoanParameters,
    ) -> Result<SubmitOutcome, ClientError> {
        let action = Action::SubmitOriginal;
        let token = self.inner.lock().await.sequencer.issue();
        let request = LoanRequest::original(params);
        let (currency, result) = match self.calculate(&request).await {
            Ok(decoded) => decoded,
            Err(err) => return Err(self.fail(action, err.into()).await),
        };
        // A custom part is never requested here; ignore one if it shows up.
        let shown = ComparisonResult::OriginalOnly {
            original: result.into_original(),
        };

        let mut guard = self.inner.lock().await;
        if !guard.sequencer.try_apply(token) {
            info!(action = action.name(), "discarding superseded response");
            return Ok(SubmitOutcome::Superseded);
        }
        guard.presenter.set_currency(currency.as_deref());
        if let Err(err) = guard.presenter.render(&shown) {
            let err = ClientError::from(err);
            record_failure(&mut guard.presenter, action, &err);
            return Err(err);
        }
        guard.session.remember_original(request.params);
        info!(
            action = action.name(),
            payments = shown.original().schedule.len(),
            "original schedule displayed"
        );
        Ok(SubmitOutcome::Applied(guard.presenter.state()))
    }

    pub async fn submit_custom(&self, amount: Decimal) -> Result<SubmitOutcome, ClientError> {
        let action = Action::SubmitCustom;
        let (token, custom, request) = {
            let mut guard = self.inner.lock().await;
            let prepared = match guard.session.base().cloned() {
                None => Err(ValidationError::NoPriorSubmission {
                    action: "comparing a custom repayment",
                }),
                Some(base) => CustomRepayment::new(amount)
                    .map(|custom| (custom, LoanRequest::with_custom(base, custom))),
            };
            match prepared {
                Ok((custom, request)) => (guard.sequencer.issue(), custom, request),
                Err(err) => {
                    let err = ClientError::from(err);
                    record_failure(&mut guard.presenter, action, &err);
                    return Err(err);
                }
            }
        };

        let (currency, result) = match self.calculate(&request).await {
            Ok(decoded) => decoded,
            Err(err) => return Err(self.fail(action, err.into()).await),
        };

        let mut guard = self.inner.lock().await;
        if !guard.sequencer.try_apply(token) {
            info!(action = action.name(), "discarding superseded response");
            return Ok(SubmitOutcome::Superseded);
        }
        guard.presenter.set_currency(currency.as_deref());

        match &result {
            ComparisonResult::WithCustom { custom: shown, diff, .. } => {
                if let Err(err) = guard.presenter.render(&result) {
                    let err = ClientError::from(err);
                    record_failure(&mut guard.presenter, action, &err);
                    return Err(err);
                }
                guard.session.remember_custom(custom);
                info!(
                    action = action.name(),
                    payments = shown.schedule.len(),
                    months_diff = diff.months_diff,
                    "custom comparison displayed"
                );
                Ok(SubmitOutcome::Applied(guard.presenter.state()))
            }
            ComparisonResult::OriginalOnly { original } => {
                let symbol = guard.presenter.currency_symbol().to_string();
                let message = format!(
                    "A custom repayment of {} was not accepted; it must exceed the minimum monthly payment of {}.",
                    format_money(&symbol, custom.amount()),
                    format_money(&symbol, original.summary.monthly_payment),
                );
                guard.session.forget_custom();
                if let Err(err) = guard.presenter.render_custom_rejected(message.clone()) {
                    let err = ClientError::from(err);
                    record_failure(&mut guard.presenter, action, &err);
                    return Err(err);
                }
                warn!(action = action.name(), amount = %custom.amount(), "custom repayment rejected");
                Err(ClientError::ServiceRejection { message })
            }
        }
    }

    /// Sends what is on screen right now, charts included, to the export
    /// service and saves the returned document.
    pub async fn export_report(&self) -> Result<ExportOutcome, ClientError> {
        let action = Action::Export;
        let (request, charts) = {
            let mut guard = self.inner.lock().await;
            let prepared = match guard.session.displayed_request() {
                None => Err(ClientError::from(ValidationError::NoPriorSubmission {
                    action: "exporting a report",
                })),
                Some(request) => guard
                    .presenter
                    .chart_images()
                    .map(|charts| (request, charts))
                    .map_err(ClientError::from),
            };
            if let Err(err) = &prepared {
                record_failure(&mut guard.presenter, action, err);
            }
            prepared?
        };

        let bytes = match self.services.export(&request, &charts).await {
            Ok(bytes) => bytes,
            Err(err) => return Err(self.fail(action, err.into()).await),
        };

        let path = self.download_dir.join(REPORT_FILENAME);
        if let Err(source) = save_report(&self.download_dir, &path, &bytes).await {
            return Err(self.fail(action, ClientError::Save { path, source }).await);
        }
        info!(
            action = action.name(),
            path = %path.display(),
            size_bytes = bytes.len(),
            custom = request.custom_repayment.is_some(),
            "report saved"
        );
        Ok(ExportOutcome {
            path,
            size_bytes: bytes.len(),
        })
    }

    async fn calculate(
        &self,
        request: &LoanRequest,
    ) -> Result<(Option<String>, ComparisonResult), TransportError> {
        let CalculateResponse {
            currency_symbol,
            result,
        } = self.services.calculate(request).await?;
        let result = ComparisonResult::try_from(result)?;

        let mut schedules = vec![("original", &result.original().schedule)];
        if let ComparisonResult::WithCustom { custom, .. } = &result {
            schedules.push(("custom", &custom.schedule));
        }
        for (label, schedule) in schedules {
            for issue in schedule.consistency_issues() {
                warn!(schedule = label, "{issue}");
            }
        }
        Ok((currency_symbol, result))
    }

    async fn fail(&self, action: Action, err: ClientError) -> ClientError {
        let mut guard = self.inner.lock().await;
        record_failure(&mut guard.presenter, action, &err);
        err
    }
}

fn record_failure(presenter: &mut PresentationController, action: Action, err: &ClientError) {
    let kind = match err {
        ClientError::Validation(_) => {
            warn!(action = action.name(), "rejected locally: {err}");
            AlertKind::Validation
        }
        ClientError::ServiceRejection { .. } => {
            warn!(action = action.name(), "rejected by service: {err}");
            AlertKind::Rejection
        }
        ClientError::Transport(_) => {
            error!(action = action.name(), "service call failed: {err}");
            AlertKind::Transport
        }
        ClientError::Surface(_) if action != Action::Export => {
            error!(action = action.name(), "chart rendering failed: {err}");
            AlertKind::Display
        }
        ClientError::Surface(_) | ClientError::Save { .. } => {
            error!(action = action.name(), "export failed: {err}");
            AlertKind::Export
        }
    };
    presenter.show_alert(kind, err.to_string());
}

async fn save_report(dir: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(path, bytes).await
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
