use std::time::Duration;

use anyhow::{Context, Result};
use common::{TaskAssignmentResponse, TaskReportRequest, TaskReportResponse};
use reqwest::Client;

/// Cliente HTTP de las RPC del coordinator. Cada llamada tiene un timeout fijo.
#[derive(Clone)]
pub struct CoordinatorClient {
    client: Client,
    base_url: String,
}

impl CoordinatorClient {
    pub fn new(base_url: impl Into<String>, rpc_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(rpc_timeout)
            .build()
            .context("no se pudo crear el cliente HTTP")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// RequestTask.
    pub async fn request_task(&self) -> Result<TaskAssignmentResponse> {
        let url = format!("{}/api/v1/tasks/request", self.base_url);
        let resp = self
            .client
            .post(&url)
            .send()
            .await
            .with_context(|| format!("no se pudo contactar al coordinator en {url}"))?
            .error_for_status()?;

        Ok(resp.json().await?)
    }

    /// ReportTask.
    pub async fn report_task(&self, report: &TaskReportRequest) -> Result<TaskReportResponse> {
        let url = format!("{}/api/v1/tasks/report", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(report)
            .send()
            .await
            .with_context(|| format!("no se pudo reportar al coordinator en {url}"))?
            .error_for_status()?;

        Ok(resp.json().await?)
    }
}
