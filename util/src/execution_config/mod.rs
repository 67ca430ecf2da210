use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::paths::config_dir;

/// How a student script is isolated from the grader.
#[derive(Debug, Clone, Deserialize, Serialize, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SandboxMode {
    /// Plain child process with a private working directory and a scrubbed environment.
    Process,
    /// Disposable container with memory/cpu/pid/network limits.
    Docker,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecutionLimits {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_memory")]
    pub max_memory: u64,

    #[serde(default = "default_max_cpus")]
    pub max_cpus: u32,

    #[serde(default = "default_max_processes")]
    pub max_processes: u32,

    /// Captured stdout/stderr are truncated to this many bytes each.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    #[serde(default = "default_sandbox")]
    pub sandbox: SandboxMode,

    #[serde(default = "default_docker_image")]
    pub docker_image: String,

    /// How many directories above the working directory are mounted (read-only)
    /// into the container, so `../../testdata` keeps resolving.
    #[serde(default = "default_docker_mount_depth")]
    pub docker_mount_depth: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_memory: default_max_memory(),
            max_cpus: default_max_cpus(),
            max_processes: default_max_processes(),
            max_output_bytes: default_max_output_bytes(),
            sandbox: default_sandbox(),
            docker_image: default_docker_image(),
            docker_mount_depth: default_docker_mount_depth(),
        }
    }
}

/// Whether the first row of a CSV file is a header.
#[derive(Debug, Clone, Deserialize, Serialize, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HeaderMode {
    /// First row is skipped only when its first cell is not a label.
    Auto,
    /// First row is always skipped.
    Present,
    /// First row is always data.
    Absent,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvaluationOptions {
    /// Callables tried in order after the script is loaded.
    #[serde(default = "default_entry_points")]
    pub entry_points: Vec<String>,

    #[serde(default = "default_prediction_file")]
    pub prediction_file: String,

    /// How many parent directories are searched for a stray prediction file.
    #[serde(default = "default_prediction_search_depth")]
    pub prediction_search_depth: usize,

    /// Prediction files are usually written by pandas, which always emits a header.
    #[serde(default = "default_prediction_header")]
    pub prediction_header: HeaderMode,

    #[serde(default = "default_label_header")]
    pub label_header: HeaderMode,

    /// Explicit ground-truth file. When set, no path guessing takes place.
    #[serde(default)]
    pub label_file: Option<PathBuf>,

    #[serde(default = "default_testdata_dir")]
    pub testdata_dir: String,

    #[serde(default = "default_label_file_name")]
    pub label_file_name: String,

    /// Directory-name patterns that identify an experiment root in a submission path.
    #[serde(default = "default_experiment_dir_patterns")]
    pub experiment_dir_patterns: Vec<String>,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            entry_points: default_entry_points(),
            prediction_file: default_prediction_file(),
            prediction_search_depth: default_prediction_search_depth(),
            prediction_header: default_prediction_header(),
            label_header: default_label_header(),
            label_file: None,
            testdata_dir: default_testdata_dir(),
            label_file_name: default_label_file_name(),
            experiment_dir_patterns: default_experiment_dir_patterns(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct RiskThresholds {
    #[serde(default = "default_critical")]
    pub critical: f64,
    #[serde(default = "default_high")]
    pub high: f64,
    #[serde(default = "default_medium")]
    pub medium: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            critical: default_critical(),
            high: default_high(),
            medium: default_medium(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimilarityOptions {
    /// Extension (without dot) of weight files inside a submission directory.
    #[serde(default = "default_weight_extension")]
    pub weight_extension: String,

    #[serde(default = "default_block_size")]
    pub block_size: usize,

    #[serde(default = "default_head_bytes")]
    pub head_bytes: usize,

    #[serde(default = "default_tail_bytes")]
    pub tail_bytes: usize,

    #[serde(default = "default_middle_samples")]
    pub middle_samples: usize,

    /// Seed for middle-window sampling; a fixed seed keeps reruns reproducible.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Relative size difference above which two files get the low base score.
    #[serde(default = "default_size_tolerance")]
    pub size_tolerance: f64,

    #[serde(default = "default_base_similar_size")]
    pub base_similar_size: f64,

    #[serde(default = "default_base_different_size")]
    pub base_different_size: f64,

    #[serde(default)]
    pub thresholds: RiskThresholds,
}

impl Default for SimilarityOptions {
    fn default() -> Self {
        Self {
            weight_extension: default_weight_extension(),
            block_size: default_block_size(),
            head_bytes: default_head_bytes(),
            tail_bytes: default_tail_bytes(),
            middle_samples: default_middle_samples(),
            seed: default_seed(),
            size_tolerance: default_size_tolerance(),
            base_similar_size: default_base_similar_size(),
            base_different_size: default_base_different_size(),
            thresholds: RiskThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub execution: ExecutionLimits,

    #[serde(default)]
    pub evaluation: EvaluationOptions,

    #[serde(default)]
    pub similarity: SimilarityOptions,
}

impl ExecutionConfig {
    pub fn default_config() -> Self {
        ExecutionConfig {
            execution: ExecutionLimits::default(),
            evaluation: EvaluationOptions::default(),
            similarity: SimilarityOptions::default(),
        }
    }

    pub fn get_execution_config(experiment_id: i64) -> Result<Self, String> {
        let cfg_dir = config_dir(experiment_id);

        let canonical = cfg_dir.join("config.json");
        let file_contents = if canonical.exists() {
            fs::read_to_string(&canonical)
                .map_err(|_| format!("Failed to read config file at {canonical:?}"))?
        } else {
            let entries = fs::read_dir(&cfg_dir)
                .map_err(|_| format!("Failed to read config dir at {cfg_dir:?}"))?;
            let mut candidates: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
                .collect();
            candidates.sort();
            let config_path = candidates
                .into_iter()
                .next()
                .ok_or_else(|| format!("No config json file found in config dir {cfg_dir:?}"))?;
            fs::read_to_string(&config_path)
                .map_err(|_| format!("Failed to read config file at {config_path:?}"))?
        };

        serde_json::from_str(&file_contents).map_err(|e| format!("Invalid config JSON format: {e}"))
    }

    /// Like [`get_execution_config`](Self::get_execution_config) but an absent
    /// config directory yields the defaults. A present but malformed file is
    /// still an error.
    pub fn load_or_default(experiment_id: i64) -> Result<Self, String> {
        if !config_dir(experiment_id).exists() {
            tracing::debug!(experiment_id, "no config directory, using defaults");
            return Ok(Self::default_config());
        }
        Self::get_execution_config(experiment_id)
    }

    pub fn save(&self, experiment_id: i64) -> Result<(), String> {
        let cfg_dir = config_dir(experiment_id);

        if let Err(e) = fs::create_dir_all(&cfg_dir) {
            return Err(format!("Failed to create config directory: {e:?}"));
        }

        let config_path = cfg_dir.join("config.json");
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config to JSON: {e}"))?;

        fs::write(&config_path, json)
            .map_err(|e| format!("Failed to write config file to disk: {e:?}"))?;

        Ok(())
    }
}

//Default Functions

fn default_timeout_secs() -> u64 {
    300
}

fn default_max_memory() -> u64 {
    8_589_934_592
}

fn default_max_cpus() -> u32 {
    2
}

fn default_max_processes() -> u32 {
    256
}

fn default_max_output_bytes() -> usize {
    1_048_576
}

fn default_sandbox() -> SandboxMode {
    SandboxMode::Process
}

fn default_docker_image() -> String {
    "dl-grader-runner".to_string()
}

fn default_docker_mount_depth() -> usize {
    2
}

fn default_entry_points() -> Vec<String> {
    vec![
        "evaluate_model".to_string(),
        "test".to_string(),
        "predict".to_string(),
    ]
}

fn default_prediction_file() -> String {
    "all_preds.csv".to_string()
}

fn default_prediction_search_depth() -> usize {
    2
}

fn default_prediction_header() -> HeaderMode {
    HeaderMode::Present
}

fn default_label_header() -> HeaderMode {
    HeaderMode::Auto
}

fn default_testdata_dir() -> String {
    "testdata".to_string()
}

fn default_label_file_name() -> String {
    "all_labels.csv".to_string()
}

fn default_experiment_dir_patterns() -> Vec<String> {
    vec![r"^lab\d+$".to_string(), r"^experiment_\d+$".to_string()]
}

fn default_weight_extension() -> String {
    "pth".to_string()
}

fn default_block_size() -> usize {
    64
}

fn default_head_bytes() -> usize {
    2048
}

fn default_tail_bytes() -> usize {
    1024
}

fn default_middle_samples() -> usize {
    10
}

fn default_seed() -> u64 {
    0x5EED_CAFE
}

fn default_size_tolerance() -> f64 {
    0.2
}

fn default_base_similar_size() -> f64 {
    50.0
}

fn default_base_different_size() -> f64 {
    30.0
}

fn default_critical() -> f64 {
    80.0
}

fn default_high() -> f64 {
    70.0
}

fn default_medium() -> f64 {
    60.0
}
