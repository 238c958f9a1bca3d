//! The two collaborator services, behind one trait so the orchestrator can
//! be driven by anything that speaks their contracts.

use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    domain::LoanRequest,
    protocol::{
        CalculateResponse, ChartImages, BALANCE_CHART_FIELD, BREAKDOWN_CHART_FIELD,
        CALCULATE_PATH, EXPORT_PATH,
    },
};
use tracing::debug;
use url::Url;

use crate::TransportError;

#[async_trait]
pub trait LoanServices: Send + Sync {
    async fn calculate(&self, request: &LoanRequest) -> Result<CalculateResponse, TransportError>;
    async fn export(
        &self,
        request: &LoanRequest,
        charts: &ChartImages,
    ) -> Result<Vec<u8>, TransportError>;
}

pub struct HttpLoanServices {
    http: Client,
    base_url: Url,
}

impl HttpLoanServices {
    pub fn new(server_url: &str) -> Result<Self, TransportError> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self, TransportError> {
        let invalid = |reason: String| TransportError::InvalidUrl {
            url: server_url.to_string(),
            reason,
        };
        let mut base_url = Url::parse(server_url.trim()).map_err(|err| invalid(err.to_string()))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(invalid("expected an http(s) base url".into()));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path)
            .map_err(|err| TransportError::InvalidUrl {
                url: format!("{}{path}", self.base_url),
                reason: err.to_string(),
            })
    }
}

async fn ensure_success(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::Status {
        status: status.as_u16(),
        body: body.trim().to_string(),
    })
}

#[async_trait]
impl LoanServices for HttpLoanServices {
    async fn calculate(&self, request: &LoanRequest) -> Result<CalculateResponse, TransportError> {
        let url = self.endpoint(CALCULATE_PATH)?;
        debug!(%url, custom = request.custom_repayment.is_some(), "posting calculation");
        let response = self
            .http
            .post(url)
            .form(&request.form_fields())
            .send()
            .await?;
        let body = ensure_success(response).await?.bytes().await?;
        serde_json::from_slice(&body).map_err(|err| TransportError::Malformed(err.to_string()))
    }

    async fn export(
        &self,
        request: &LoanRequest,
        charts: &ChartImages,
    ) -> Result<Vec<u8>, TransportError> {
        let url = self.endpoint(EXPORT_PATH)?;
        let mut fields = request.form_fields();
        fields.push((BALANCE_CHART_FIELD, charts.balance_chart_b64.clone()));
        fields.push((BREAKDOWN_CHART_FIELD, charts.breakdown_chart_b64.clone()));
        debug!(%url, "posting export");
        let response = self.http.post(url).form(&fields).send().await?;
        let bytes = ensure_success(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}
