use std::time::Duration;

use futures::future::join_all;
use reqwest::header::AUTHORIZATION;
use tracing::warn;

use super::payload::CheckPayload;
use crate::config::Checker as CheckerConfig;
use crate::models::{JobType, Monitor};

/// Header telling the execution tier which region must run the probe.
const REGION_HEADER: &str = "fly-prefer-region";

/// Aggregate outcome of one fan-out, reported to the observability sink.
/// Individual regional failures never fail the trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub accepted: usize,
    pub failed: usize,
}

/// Client for the remote regional execution tier.
pub struct CheckerClient {
    client: reqwest::Client,
    config: CheckerConfig,
    secret: String,
}

impl CheckerClient {
    pub fn new(config: CheckerConfig, secret: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.dispatch_timeout_seconds))
            .build()?;

        Ok(Self { client, config, secret })
    }

    /// Fixed execution endpoint for a job type, parameterized by monitor id
    /// and the manual-trigger marker.
    fn checker_url(&self, job_type: JobType, monitor_id: i64) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        format!("{base}/checker/{job_type}?monitor_id={monitor_id}&trigger=api&data=true")
    }

    async fn send_once(
        &self,
        url: &str,
        region: &str,
        payload: &CheckPayload,
    ) -> Result<(), reqwest::Error> {
        self.client
            .post(url)
            .header(REGION_HEADER, region)
            .header(AUTHORIZATION, format!("Basic {}", self.secret))
            .json(payload)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    /// One regional dispatch with bounded doubling backoff.
    async fn dispatch_region(
        &self,
        url: &str,
        region: &str,
        payload: &CheckPayload,
    ) -> Result<(), reqwest::Error> {
        let mut delay = Duration::from_millis(self.config.retry_delay_ms);
        let mut attempt = 0;

        loop {
            match self.send_once(url, region, payload).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < self.config.max_retries => {
                    warn!(region, attempt, error = %err, "check dispatch failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Fan a run's payloads out to every region concurrently and wait for
    /// all of them to settle. One slow or failing region never cancels the
    /// others; failures are logged and counted, not propagated.
    pub async fn dispatch(
        &self,
        monitor: &Monitor,
        payloads: &[(String, CheckPayload)],
    ) -> DispatchSummary {
        let url = self.checker_url(monitor.job_type, monitor.id);

        let sends = payloads.iter().map(|(region, payload)| {
            let url = url.as_str();
            async move { (region, self.dispatch_region(url, region, payload).await) }
        });

        let mut summary = DispatchSummary::default();
        for (region, outcome) in join_all(sends).await {
            match outcome {
                Ok(()) => summary.accepted += 1,
                Err(err) => {
                    warn!(region = %region, error = %err, "regional check dispatch failed");
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}
