use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

use super::{JobState, MediaFile, SynthesisRequest, TalkClient};
use crate::error::AppError;
use crate::media::{MediaProbe, MediaStore};

/// Drives one talks job end to end: validate, submit, poll to a terminal
/// state under a wall-clock deadline, stream the result into the store,
/// then gate on an audio-stream check.
///
/// Holds no per-job state, so concurrent jobs are independent calls.
pub struct Synthesizer {
    client: Arc<dyn TalkClient>,
    probe: Arc<dyn MediaProbe>,
    store: MediaStore,
    http_client: reqwest::Client,
    poll_interval: Duration,
    deadline: Duration,
}

impl Synthesizer {
    pub fn new(client: Arc<dyn TalkClient>, probe: Arc<dyn MediaProbe>, store: MediaStore) -> Self {
        Self {
            client,
            probe,
            store,
            http_client: reqwest::Client::new(),
            poll_interval: Duration::from_secs(2),
            deadline: Duration::from_secs(300),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub async fn synthesize(&self, request: &SynthesisRequest) -> Result<MediaFile, AppError> {
        validate(request)?;

        let job_id = self
            .client
            .create_talk(request)
            .await
            .map_err(|e| AppError::SubmissionFailed(e.to_string()))?;
        info!(
            "synthesizer: submitted job {} for {}",
            job_id, request.output_file_name
        );

        let result_url = self.poll_until_terminal(&job_id).await?;
        let media = self
            .download(&result_url, &request.output_file_name)
            .await?;

        let has_audio = self
            .probe
            .has_audio_stream(&media.path)
            .await
            .map_err(|e| AppError::Inspection(e.to_string()))?;
        if !has_audio {
            warn!("synthesizer: {} has no audio stream", media.name);
            return Err(AppError::MissingAudioTrack(media.path));
        }

        info!(
            "synthesizer: job {} complete, {} is {} bytes",
            job_id, media.name, media.size
        );
        Ok(media)
    }

    async fn poll_until_terminal(&self, job_id: &str) -> Result<String, AppError> {
        let submitted_at = Instant::now();
        loop {
            match self.client.talk_state(job_id).await {
                Ok(JobState::Done { result_url }) => return Ok(result_url),
                Ok(JobState::Failed { reason }) => {
                    warn!("synthesizer: job {} failed: {}", job_id, reason);
                    return Err(AppError::JobFailed(reason));
                }
                Ok(JobState::Pending) => {
                    debug!("synthesizer: job {} still pending", job_id)
                }
                // A failed poll is not a failed job; keep polling until
                // the deadline.
                Err(e) => warn!("synthesizer: poll for job {} failed: {}", job_id, e),
            }
            if submitted_at.elapsed() >= self.deadline {
                warn!("synthesizer: job {} exceeded {:?}", job_id, self.deadline);
                return Err(AppError::Timeout(self.deadline));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn download(&self, url: &str, name: &str) -> Result<MediaFile, AppError> {
        let started_at = Instant::now();
        let mut response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Download(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Download(format!(
                "result fetch returned {}",
                status
            )));
        }

        // Gate on the declared content type before any byte hits disk
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("(none)")
            .to_string();
        if !content_type.starts_with("video/") {
            warn!("synthesizer: refusing non-video result: {}", content_type);
            return Err(AppError::UnexpectedContentType(content_type));
        }

        // Filesystem failures from here on count as download failures
        let mut staged = self
            .store
            .create(name)
            .await
            .map_err(|e| AppError::Download(e.to_string()))?;
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if let Err(e) = staged.write(&chunk).await {
                        staged.discard().await;
                        return Err(AppError::Download(e.to_string()));
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    staged.discard().await;
                    return Err(AppError::Download(e.to_string()));
                }
            }
        }
        let (path, size) = staged
            .commit()
            .await
            .map_err(|e| AppError::Download(e.to_string()))?;
        info!(
            "synthesizer: downloaded {} bytes in {:?} for {}",
            size,
            started_at.elapsed(),
            name
        );
        Ok(MediaFile {
            name: name.to_string(),
            path,
            size,
        })
    }
}

fn validate(request: &SynthesisRequest) -> Result<(), AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::InvalidRequest("text is required".to_string()));
    }
    if request.source_image_url.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "source_image_url is required".to_string(),
        ));
    }
    if Url::parse(&request.source_image_url).is_err() {
        return Err(AppError::InvalidRequest(format!(
            "source_image_url is not a valid url: {}",
            request.source_image_url
        )));
    }
    if !MediaStore::is_valid_name(&request.output_file_name) {
        return Err(AppError::InvalidRequest(format!(
            "output_file_name is not addressable: {:?}",
            request.output_file_name
        )));
    }
    Ok(())
}
