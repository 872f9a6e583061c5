use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{JobState, SynthesisRequest, TalkClient};
use crate::config::SynthesisConfig;
use crate::version::get_useragent;

// Talks API response structures
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTalkResponse {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TalkStatusResponse {
    pub status: String,
    pub result_url: Option<String>,
    pub error: Option<serde_json::Value>,
}

/// Client for the talks API: submits text + driving image, reads job
/// status back by id.
pub struct DidTalkClient {
    http_client: HttpClient,
    config: SynthesisConfig,
    api_key: String,
}

impl DidTalkClient {
    pub fn new(config: SynthesisConfig, api_key: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            config,
            api_key,
        }
    }

    // The credential is stored pre-encoded, exactly as the provider hands it out.
    fn authorization(&self) -> String {
        format!("Basic {}", self.api_key)
    }
}

#[async_trait]
impl TalkClient for DidTalkClient {
    async fn create_talk(&self, request: &SynthesisRequest) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(anyhow!("missing talks api credential"));
        }

        let body = serde_json::json!({
            "script": {
                "type": "text",
                "input": request.text,
                "provider": {
                    "type": self.config.provider,
                    "voice_id": self.config.voice,
                    "ssml": false
                }
            },
            "source_url": request.source_image_url,
            "config": {
                "fluent": self.config.fluent,
                "pad_audio": self.config.pad_audio,
                "align_driver": self.config.align_driver,
                "sharpen": self.config.sharpen,
                "stitch": self.config.stitch
            }
        });

        let response = self
            .http_client
            .post(format!("{}/talks", self.config.api_url))
            .header("Authorization", self.authorization())
            .header("User-Agent", get_useragent())
            .timeout(Duration::from_secs(15))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("talks api returned {}: {}", status, detail));
        }
        let parsed: CreateTalkResponse = response.json().await?;
        match parsed.id {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(anyhow!("talks api response carried no job id")),
        }
    }

    async fn talk_state(&self, id: &str) -> Result<JobState> {
        let response = self
            .http_client
            .get(format!("{}/talks/{}", self.config.api_url, id))
            .header("Authorization", self.authorization())
            .header("User-Agent", get_useragent())
            .timeout(Duration::from_secs(15))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("talks api returned {} for job {}", status, id));
        }
        let parsed: TalkStatusResponse = response.json().await?;
        Ok(translate_status(parsed))
    }
}

/// Fold the provider's status vocabulary into `JobState`; states this
/// build does not know about read as pending.
fn translate_status(response: TalkStatusResponse) -> JobState {
    match response.status.as_str() {
        "done" => match response.result_url {
            Some(url) if !url.is_empty() => JobState::Done { result_url: url },
            _ => JobState::Failed {
                reason: "job done but no result_url returned".to_string(),
            },
        },
        "error" | "rejected" => {
            let reason = response
                .error
                .map(|e| e.to_string())
                .unwrap_or_else(|| response.status.clone());
            JobState::Failed { reason }
        }
        other => {
            debug!("didtalk: status {:?} treated as pending", other);
            JobState::Pending
        }
    }
}
