//! Host configuration
//!
//! The configuration is normally read from a TOML file by the embedding
//! device model and handed to [`crate::ServerState::new`].

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// How guest surfaces reach the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderType {
    /// Host renders into pbuffers, pixels are copied back into guest memory
    Offscreen,
    /// Host renders into windows bound to guest window-system ids
    Onscreen,
}

impl RenderType {
    /// Value reported to the guest by the init call
    pub fn wire_value(self) -> u32 {
        match self {
            RenderType::Offscreen => 1,
            RenderType::Onscreen => 2,
        }
    }
}

/// Host GL/EGL driver selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostBackend {
    /// Built-in recording driver, no real GPU involved
    Headless,
}

/// Policy for arrays flagged as direct by the guest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectTransferMode {
    /// Every access goes through the emulator's debug virtual memory accessor
    Debug,
    /// Pages are translated first, then accessed through physical mappings
    Paged,
}

/// Whether GLSL ES precision qualifiers are removed before compiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecisionMode {
    /// Probe the host compiler once per context
    Auto,
    /// Always strip
    Always,
    /// Never strip
    Never,
}

/// YaGL host configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct YaglConfig {
    /// Surface rendering model reported to guests
    pub render_type: RenderType,
    /// Host GL/EGL driver
    pub backend: HostBackend,
    /// Access policy for direct arrays
    pub direct_transfer: DirectTransferMode,
    /// In-arrays allowed per call
    pub max_in_arrays: usize,
    /// Out-arrays allowed per call
    pub max_out_arrays: usize,
    /// Guest page size
    pub page_size: usize,
    /// Shader precision qualifier handling
    pub strip_precision: PrecisionMode,
}

impl Default for YaglConfig {
    fn default() -> Self {
        Self {
            render_type: RenderType::Offscreen,
            backend: HostBackend::Headless,
            direct_transfer: DirectTransferMode::Debug,
            max_in_arrays: crate::MAX_IN_ARRAYS,
            max_out_arrays: crate::MAX_OUT_ARRAYS,
            page_size: crate::PAGE_SIZE,
            strip_precision: PrecisionMode::Auto,
        }
    }
}

impl YaglConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> crate::Result<Self> {
        let config: YaglConfig =
            toml::from_str(text).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        log::info!("yagl: loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.page_size == 0 || !self.page_size.is_power_of_two() {
            return Err(crate::Error::Config(format!(
                "page_size {} is not a power of two",
                self.page_size
            )));
        }
        if self.page_size % crate::SLOT_SIZE != 0 {
            return Err(crate::Error::Config(format!(
                "page_size {} is not slot aligned",
                self.page_size
            )));
        }
        if self.max_in_arrays == 0 || self.max_out_arrays == 0 {
            return Err(crate::Error::Config(
                "array limits must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = YaglConfig::default();
        assert_eq!(config.render_type, RenderType::Offscreen);
        assert_eq!(config.page_size, 4096);
        assert_eq!(config.max_in_arrays, 8);
        assert_eq!(config.max_out_arrays, 8);
    }

    #[test]
    fn test_parse_partial() {
        let config = YaglConfig::from_toml_str(
            r#"
            render_type = "onscreen"
            direct_transfer = "paged"
            strip_precision = "always"
            "#,
        )
        .unwrap();
        assert_eq!(config.render_type, RenderType::Onscreen);
        assert_eq!(config.render_type.wire_value(), 2);
        assert_eq!(config.direct_transfer, DirectTransferMode::Paged);
        assert_eq!(config.strip_precision, PrecisionMode::Always);
        assert_eq!(config.backend, HostBackend::Headless);
    }

    #[test]
    fn test_reject_bad_page_size() {
        assert!(YaglConfig::from_toml_str("page_size = 1000").is_err());
        assert!(YaglConfig::from_toml_str("render_type = \"vulkan\"").is_err());
    }
}
