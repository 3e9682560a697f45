use serde::{Deserialize, Serialize};

/// Top-level GPUQ configuration, loaded from gpuq.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpuqConfig {
    #[serde(default)]
    pub pool: PoolConfig,
}

/// Execution-unit pool tuning. Both knobs bound memory; neither is required
/// for correctness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Units to preallocate at context construction
    #[serde(default)]
    pub warm_units: u32,
    /// Free-list cap; surplus units are released at reclaim (None = unbounded)
    pub max_free_units: Option<u32>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            warm_units: 0,
            max_free_units: None,
        }
    }
}

impl GpuqConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: GpuqConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from file if it exists, otherwise return defaults.
    pub fn load_or_default(path: &str) -> Self {
        Self::load(path).unwrap_or_default()
    }
}

/// Returns the default config file path based on platform conventions.
/// Search order:
/// 1. System-wide config: `/etc/gpuq/gpuq.toml`
/// 2. Local fallback: `./gpuq.toml`
pub fn default_config_path() -> String {
    let system_path = "/etc/gpuq/gpuq.toml";
    if std::path::Path::new(system_path).exists() {
        return system_path.to_string();
    }
    "gpuq.toml".to_string()
}
