//! Loads `wrap-demo`'s `WrapOptions` overrides from environment variables
//! and an optional TOML file, layered lowest-to-highest priority.

use std::collections::HashMap;
use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

fn default_sampling_rate() -> f64 {
    1.0
}

/// Overridable knobs for the demo's `WrapOptions`. CLI flags take
/// precedence over `WRAP_DEMO_`-prefixed env vars, which take precedence
/// over the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Un-redact error messages and enable verbose logging.
    #[serde(default)]
    pub debug: bool,
    /// Field names to redact before any plugin sees them.
    #[serde(default)]
    pub redact_fields: Vec<String>,
    /// Wall-clock cap, in ms, for the whole before+handler+after sequence.
    #[serde(default)]
    pub max_execution_time_ms: Option<u64>,
    /// Fraction of calls sampled for detailed performance logging.
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,
    /// Per-threshold-name latency budgets, in ms.
    #[serde(default)]
    pub thresholds: HashMap<String, u64>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            debug: false,
            redact_fields: Vec::new(),
            max_execution_time_ms: None,
            sampling_rate: default_sampling_rate(),
            thresholds: HashMap::new(),
        }
    }
}

impl DemoConfig {
    /// Merge the default config file location (`./wrap-demo.toml`, if
    /// present), `WRAP_DEMO_`-prefixed env vars, and `cli_overrides`, in
    /// ascending precedence.
    pub fn load(cli_overrides: &DemoConfig, config_path: Option<PathBuf>) -> Result<Self, anyhow::Error> {
        let config_path = config_path.unwrap_or_else(|| PathBuf::from("wrap-demo.toml"));
        Ok(Figment::new()
            .admerge(Toml::file(config_path))
            .admerge(Env::prefixed("WRAP_DEMO_"))
            .admerge(Serialized::defaults(cli_overrides))
            .extract()?)
    }
}
