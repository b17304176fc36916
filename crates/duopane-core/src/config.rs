//! Engine configuration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default number of items above which a batch asks for a progress surface.
pub const DEFAULT_PROGRESS_THRESHOLD: usize = 5;

/// Default buffer size for progress and conflict channels.
pub const DEFAULT_CHANNEL_SIZE: usize = 100;

/// Configuration for the file operation engine.
///
/// Deserialization goes through the builder, so loaded configs are
/// validated like built ones.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(try_from = "EngineConfigFile")]
pub struct EngineConfig {
    /// Batches with more items than this present a cancellable progress
    /// surface to the user.
    #[builder(default = "DEFAULT_PROGRESS_THRESHOLD")]
    pub progress_threshold: usize,

    /// Buffer size for event broadcast and conflict prompt channels.
    #[builder(default = "DEFAULT_CHANNEL_SIZE")]
    pub channel_size: usize,

    /// Recreate symbolic links when copying directories instead of
    /// copying what they point to.
    #[builder(default = "true")]
    pub copy_symlinks_as_links: bool,
}

/// On-disk shape of [`EngineConfig`]; missing fields take their defaults.
#[derive(Deserialize)]
struct EngineConfigFile {
    #[serde(default = "default_progress_threshold")]
    progress_threshold: usize,
    #[serde(default = "default_channel_size")]
    channel_size: usize,
    #[serde(default = "default_true")]
    copy_symlinks_as_links: bool,
}

impl TryFrom<EngineConfigFile> for EngineConfig {
    type Error = EngineConfigBuilderError;

    fn try_from(file: EngineConfigFile) -> Result<Self, Self::Error> {
        EngineConfig::builder()
            .progress_threshold(file.progress_threshold)
            .channel_size(file.channel_size)
            .copy_symlinks_as_links(file.copy_symlinks_as_links)
            .build()
    }
}

fn default_progress_threshold() -> usize {
    DEFAULT_PROGRESS_THRESHOLD
}

fn default_channel_size() -> usize {
    DEFAULT_CHANNEL_SIZE
}

fn default_true() -> bool {
    true
}

impl EngineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.channel_size == Some(0) {
            return Err("Channel size must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Create a new engine config builder.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Check if a batch of `items` items should present a progress surface.
    pub fn should_present_progress(&self, items: usize) -> bool {
        items > self.progress_threshold
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            progress_threshold: DEFAULT_PROGRESS_THRESHOLD,
            channel_size: DEFAULT_CHANNEL_SIZE,
            copy_symlinks_as_links: true,
        }
    }
}
