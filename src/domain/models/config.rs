use serde::{Deserialize, Serialize};

use super::eligibility::AccuracyGating;
use super::reference::DEFAULT_REFERENCE_CODE;

/// Main configuration structure for the dojo
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Maximum number of CPUs a trial may use at once
    #[serde(default = "default_max_ncpus")]
    pub max_ncpus: usize,

    /// Highest trial level to run (all levels when unset)
    #[serde(default)]
    pub max_level: Option<u32>,

    /// Verbosity level
    #[serde(default)]
    pub verbose: u8,

    /// Directory under which `DOJO_<pseudo>` work directories are created
    #[serde(default = "default_work_root")]
    pub work_root: String,

    /// Progression rule configuration
    #[serde(default)]
    pub progression: ProgressionConfig,

    /// External workflow commands, one per trial
    #[serde(default)]
    pub workflows: WorkflowsConfig,

    /// Reference database configuration
    #[serde(default)]
    pub reference: ReferenceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

const fn default_max_ncpus() -> usize {
    1
}

fn default_work_root() -> String {
    ".".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_ncpus: default_max_ncpus(),
            max_level: None,
            verbose: 0,
            work_root: default_work_root(),
            progression: ProgressionConfig::default(),
            workflows: WorkflowsConfig::default(),
            reference: ReferenceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Progression rule configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProgressionConfig {
    /// Whether advancing a level requires the same accuracy tier below it
    #[serde(default)]
    pub accuracy_gating: AccuracyGating,
}

/// Workflow commands per trial
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkflowsConfig {
    #[serde(default)]
    pub hints: CommandConfig,

    #[serde(default)]
    pub delta_factor: CommandConfig,
}

/// External program that executes one workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CommandConfig {
    /// Executable to run (empty when the trial is not configured)
    #[serde(default)]
    pub program: String,

    /// Arguments passed before the parameters file
    #[serde(default)]
    pub args: Vec<String>,

    /// File the program writes its results to, relative to the work directory
    #[serde(default = "default_results_file")]
    pub results_file: String,
}

fn default_results_file() -> String {
    "results.json".to_string()
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            program: String::new(),
            args: vec![],
            results_file: default_results_file(),
        }
    }
}

impl CommandConfig {
    pub fn is_configured(&self) -> bool {
        !self.program.is_empty()
    }
}

/// Reference database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReferenceConfig {
    /// Path to the JSON reference database
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Code whose entries are used as reference
    #[serde(default = "default_reference_code")]
    pub code: String,
}

fn default_database_path() -> String {
    ".dojo/reference.json".to_string()
}

fn default_reference_code() -> String {
    DEFAULT_REFERENCE_CODE.to_string()
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            code: default_reference_code(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Log file rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
