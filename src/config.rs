use anyhow::Error;
use clap::Parser;
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(
    version = crate::version::get_short_version(),
    long_about = crate::version::get_version_info()
)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[clap(long)]
    pub conf: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub http_addr: String,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    pub media_dir: String,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Base URL of the talks API.
    pub api_url: String,
    /// Basic credential for the talks API, already base64 encoded.
    /// Falls back to the DID_API_KEY environment variable when unset.
    pub api_key: Option<String>,
    pub provider: String,
    pub voice: String,
    pub poll_interval_ms: u64,
    pub deadline_secs: u64,
    pub fluent: bool,
    pub pad_audio: f32,
    pub align_driver: bool,
    pub sharpen: bool,
    pub stitch: bool,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.d-id.com".to_string(),
            api_key: None,
            provider: "microsoft".to_string(),
            voice: "en-US-JennyNeural".to_string(),
            poll_interval_ms: 2000,
            deadline_secs: 300,
            fluent: true,
            pad_audio: 0.0,
            align_driver: true,
            sharpen: true,
            stitch: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:8080".to_string(),
            log_level: Some("info".to_string()),
            log_file: None,
            #[cfg(target_os = "windows")]
            media_dir: "./media".to_string(),
            #[cfg(not(target_os = "windows"))]
            media_dir: "/tmp/lecturecast/media".to_string(),
            synthesis: SynthesisConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Error> {
        let config = toml::from_str(
            &std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("{}: {}", e, path))?,
        )?;
        Ok(config)
    }
}
