use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod did;
pub mod synthesizer;
pub use did::DidTalkClient;
pub use synthesizer::Synthesizer;


/// One text + driving image to turn into a talking-head video.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub source_image_url: String,
    pub output_file_name: String,
}

/// A committed, verified artifact in the media store.
#[derive(Debug, Clone, Serialize)]
pub struct MediaFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Provider job state folded down to what the pipeline acts on.
/// Translation from the provider's status vocabulary happens inside
/// the client, so the poll loop never sees provider strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Done { result_url: String },
    Failed { reason: String },
}

/// Provider-facing slice of the pipeline: create a job, read it back.
#[async_trait]
pub trait TalkClient: Send + Sync {
    /// Submit a new job, returning the provider-assigned id.
    async fn create_talk(&self, request: &SynthesisRequest) -> Result<String>;

    /// Observe the current state of a previously created job.
    async fn talk_state(&self, id: &str) -> Result<JobState>;
}
