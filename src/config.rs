//! Configuration for CellKV
//!
//! Centralized configuration with sensible defaults.

/// Main configuration for a CellKV store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Capacity Configuration
    // -------------------------------------------------------------------------
    /// Bytes at the end of the medium that inserts never consume.
    /// An insert fits only while `reserved + used < capacity - safety_margin`.
    pub safety_margin: usize,

    /// Largest medium capacity `begin()` accepts (in bytes)
    pub max_capacity: usize,

    // -------------------------------------------------------------------------
    // Size Accounting Configuration
    // -------------------------------------------------------------------------
    /// Length of the terminator run that marks the end of the log
    pub end_marker_run: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            safety_margin: 5,
            max_capacity: 10 * 1024, // 10 KB
            end_marker_run: 3,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the safety margin (in bytes)
    pub fn safety_margin(mut self, bytes: usize) -> Self {
        self.config.safety_margin = bytes;
        self
    }

    /// Set the maximum accepted medium capacity (in bytes)
    pub fn max_capacity(mut self, bytes: usize) -> Self {
        self.config.max_capacity = bytes;
        self
    }

    /// Set the terminator run length used as end-of-log marker
    pub fn end_marker_run(mut self, len: usize) -> Self {
        self.config.end_marker_run = len.max(2);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.safety_margin, 5);
        assert_eq!(config.end_marker_run, 3);
        assert_eq!(config.max_capacity, 10240);
    }

    #[test]
    fn builder_overrides() {
        let config = Config::builder()
            .safety_margin(8)
            .max_capacity(4096)
            .end_marker_run(0)
            .build();
        assert_eq!(config.safety_margin, 8);
        assert_eq!(config.max_capacity, 4096);
        // Shorter runs would match the terminator of every record
        assert_eq!(config.end_marker_run, 2);
    }
}
