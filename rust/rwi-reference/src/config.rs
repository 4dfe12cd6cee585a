use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Containers up to this size are expanded on the calling thread.
pub const INLINE_THRESHOLD: usize = 100;

/// Number of entries that justify one additional worker thread.
pub const ENTRIES_PER_WORKER: usize = 100;

/// Configuration of the reference materializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterializeConfig {
    /// Largest container expanded inline, without spawning threads.
    pub inline_threshold: usize,
    /// Entries per worker when sizing the pool.
    pub entries_per_worker: usize,
    /// Core count used to cap the pool. `None` queries the machine on every call.
    pub available_cores: Option<usize>,
}

impl Default for MaterializeConfig {
    fn default() -> Self {
        Self {
            inline_threshold: INLINE_THRESHOLD,
            entries_per_worker: ENTRIES_PER_WORKER,
            available_cores: None,
        }
    }
}

impl MaterializeConfig {
    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.entries_per_worker == 0 {
            return Err("entries_per_worker must be greater than 0".to_string());
        }
        if self.available_cores == Some(0) {
            return Err("available_cores must be greater than 0 when set".to_string());
        }
        Ok(())
    }

    pub fn with_available_cores(mut self, cores: usize) -> Self {
        self.available_cores = Some(cores);
        self
    }

    /// Configured core count, or the machine's parallelism.
    pub fn cores(&self) -> usize {
        self.available_cores.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Worker count for a container of `len` entries: `min(cores, len / batch) + 1`.
    pub fn worker_count(&self, len: usize) -> usize {
        self.cores().min(len / self.entries_per_worker.max(1)) + 1
    }
}

/// Configuration of the index abstract encoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbstractConfig {
    /// Encoding time budget in milliseconds. `None` means unbounded.
    pub time_budget_ms: Option<u64>,
}

impl AbstractConfig {
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MaterializeConfig::default();
        assert_eq!(config.inline_threshold, 100);
        assert_eq!(config.entries_per_worker, 100);
        assert!(config.validate().is_ok());
        assert!(config.cores() >= 1);
        assert_eq!(AbstractConfig::default().time_budget(), None);
    }

    #[test]
    fn test_worker_count() {
        let config = MaterializeConfig::default().with_available_cores(4);
        assert_eq!(config.worker_count(150), 2);
        assert_eq!(config.worker_count(500), 5);
        assert_eq!(config.worker_count(100_000), 5);
        let single = MaterializeConfig::default().with_available_cores(1);
        assert_eq!(single.worker_count(500), 2);
    }

    #[test]
    fn test_validate() {
        let config = MaterializeConfig {
            entries_per_worker: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = MaterializeConfig::default().with_available_cores(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize() {
        let config: MaterializeConfig =
            serde_json::from_str(r#"{"available_cores": 3}"#).unwrap();
        assert_eq!(config.available_cores, Some(3));
        assert_eq!(config.inline_threshold, 100);

        let config: AbstractConfig = serde_json::from_str(r#"{"time_budget_ms": 250}"#).unwrap();
        assert_eq!(config.time_budget(), Some(Duration::from_millis(250)));
        let config: AbstractConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AbstractConfig::default());
    }
}
