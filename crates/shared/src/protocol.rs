use serde::{Deserialize, Serialize};

use crate::{
    domain::{ComparisonDiff, ComparisonResult, ScheduleResult},
    error::ProtocolError,
};

pub const CALCULATE_PATH: &str = "calculate";
pub const EXPORT_PATH: &str = "download_excel";
pub const BALANCE_CHART_FIELD: &str = "chart1_base64";
pub const BREAKDOWN_CHART_FIELD: &str = "chart2_base64";

/// Success body of `POST /calculate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_symbol: Option<String>,
    pub result: ComparisonPayload,
}

/// The service's loosely shaped result; converted into [`ComparisonResult`]
/// before anything else looks at it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonPayload {
    pub original: ScheduleResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<ScheduleResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difference: Option<ComparisonDiff>,
}

impl TryFrom<ComparisonPayload> for ComparisonResult {
    type Error = ProtocolError;

    fn try_from(payload: ComparisonPayload) -> Result<Self, Self::Error> {
        match (payload.custom, payload.difference) {
            (None, None) => Ok(ComparisonResult::OriginalOnly {
                original: payload.original,
            }),
            (Some(custom), Some(diff)) => Ok(ComparisonResult::WithCustom {
                original: payload.original,
                custom,
                diff,
            }),
            (Some(_), None) => Err(ProtocolError::CustomWithoutDifference),
            (None, Some(_)) => Err(ProtocolError::DifferenceWithoutCustom),
        }
    }
}

/// PNG snapshots of the two on-screen charts, base64 encoded for the export form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartImages {
    pub balance_chart_b64: String,
    pub breakdown_chart_b64: String,
}
