//! Environment configuration.

use std::env;
use std::str::FromStr;

pub const DEFAULT_BATCH_MS: u64 = 50;
pub const DEFAULT_SUMMARY_WIDTH: usize = 80;

/// How a streaming slot looks between batched renders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamRenderMode {
    /// Committed text as plain text plus a marked tail span for the latest fragment.
    #[default]
    Tail,
    /// The whole accumulated text re-rendered as markdown on every batch.
    Markdown,
}

impl FromStr for StreamRenderMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tail" => Ok(Self::Tail),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(format!("unknown stream render mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Delay between the first buffered delta and its batched render.
    pub batch_ms: u64,
    pub stream_mode: StreamRenderMode,
    /// Unknown region names are errors instead of logged no-ops.
    pub strict_regions: bool,
    /// Maximum display width of a tool call's `data-summary`.
    pub summary_width: usize,
    pub log_filter: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_ms: DEFAULT_BATCH_MS,
            stream_mode: StreamRenderMode::Tail,
            strict_regions: cfg!(debug_assertions),
            summary_width: DEFAULT_SUMMARY_WIDTH,
            log_filter: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            batch_ms: env_parse("CHAT_DOM_BATCH_MS")
                .map(|ms: u64| ms.max(1))
                .unwrap_or(defaults.batch_ms),
            stream_mode: env_parse("CHAT_DOM_STREAM_MODE").unwrap_or(defaults.stream_mode),
            strict_regions: env_flag_or("CHAT_DOM_STRICT_REGIONS", defaults.strict_regions),
            summary_width: env_parse("CHAT_DOM_SUMMARY_WIDTH")
                .filter(|width: &usize| *width > 0)
                .unwrap_or(defaults.summary_width),
            log_filter: env_string_opt("CHAT_DOM_LOG"),
        }
    }

    pub fn with_batch_ms(mut self, batch_ms: u64) -> Self {
        self.batch_ms = batch_ms.max(1);
        self
    }

    pub fn with_stream_mode(mut self, stream_mode: StreamRenderMode) -> Self {
        self.stream_mode = stream_mode;
        self
    }

    pub fn with_strict_regions(mut self, strict_regions: bool) -> Self {
        self.strict_regions = strict_regions;
        self
    }
}

fn env_flag_or(key: &str, default: bool) -> bool {
    match env_string_opt(key).as_deref() {
        Some("1") => true,
        Some("0") => false,
        _ => default,
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let value = env_string_opt(key)?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key, value = %value, "ignoring unparsable environment value");
            None
        }
    }
}
