use clap::{CommandFactory, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default Gemini model used for classification.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Default Gemini REST base URL.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Messages submitted per classification request.
pub const DEFAULT_BATCH_SIZE: usize = 15;

// ── Policies ───────────────────────────────────────────────────────────────────

/// How a classifier reply with some malformed entries is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaPolicy {
    /// Any invalid entry discards the whole batch.
    #[default]
    Strict,
    /// Invalid entries are dropped, valid ones are kept.
    Lenient,
}

/// What to do with transcript lines that precede the first message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkippedLinePolicy {
    /// Log a warning with the number of dropped lines.
    #[default]
    Warn,
    /// Drop them without a diagnostic.
    Silent,
}

/// Report format written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Colored message cards and a summary panel.
    #[default]
    Text,
    /// A single JSON document.
    Json,
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Scan exported chat transcripts for phishing, fraud and social engineering
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sentinel-chat",
    about = "Scan exported chat transcripts for phishing, fraud and social engineering",
    version
)]
pub struct Settings {
    /// Transcript file, or a directory scanned recursively for .txt exports
    pub path: Option<PathBuf>,

    /// Send the parsed messages to the classifier
    #[arg(long)]
    pub analyze: bool,

    /// API key for the classification service
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Classification model
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the classification API
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Messages per classification request (1-100)
    #[arg(long, default_value = "15", value_parser = clap::value_parser!(u16).range(1..=100))]
    pub batch_size: u16,

    /// Only submit the first N messages for classification
    #[arg(long)]
    pub max_messages: Option<usize>,

    /// Handling of classifier replies that contain malformed entries
    #[arg(long, value_enum, default_value_t = SchemaPolicy::Strict)]
    pub schema_policy: SchemaPolicy,

    /// Handling of lines that appear before the first message header
    #[arg(long, value_enum, default_value_t = SkippedLinePolicy::Warn)]
    pub skipped_lines: SkippedLinePolicy,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Only print cards for messages flagged as threats
    #[arg(long)]
    pub threats_only: bool,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["dark", "light", "plain", "auto"])]
    pub theme: String,

    /// Card width in columns (40-200)
    #[arg(long, default_value = "80", value_parser = clap::value_parser!(u16).range(40..=200))]
    pub width: u16,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.sentinel-chat/last_used.json`.
///
/// The API key is deliberately absent.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_policy: Option<SchemaPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_lines: Option<SkippedLinePolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".sentinel-chat").join("last_used.json")
    }

    /// Load persisted params from the default path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load persisted params from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::debug!("ignoring unreadable {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Atomically write params to the default path, creating parent directories
    /// if needed.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&Self::config_path())
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        // Write to a temp file then rename for atomicity.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the default config file if it exists.
    pub fn clear() -> Result<(), std::io::Error> {
        Self::clear_at(&Self::config_path())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation. Accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!("failed to clear {}: {}", config_path.display(), e);
            }
            return Self::resolve(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins. clap keys matches by field name, not flag spelling.
        if !is_arg_explicitly_set(&matches, "model") {
            if let Some(v) = last.model {
                settings.model = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "batch_size") {
            if let Some(v) = last.batch_size.filter(|v| (1..=100).contains(v)) {
                settings.batch_size = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "schema_policy") {
            if let Some(v) = last.schema_policy {
                settings.schema_policy = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "skipped_lines") {
            if let Some(v) = last.skipped_lines {
                settings.skipped_lines = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "output") {
            if let Some(v) = last.output {
                settings.output = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last.theme {
                settings.theme = v;
            }
        }

        settings = Self::resolve(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!("could not persist settings: {}", e);
        }

        settings
    }

    /// Apply `--debug`, the `API_KEY` fallback and key normalisation.
    fn resolve(mut settings: Settings) -> Settings {
        if settings.api_key.is_none() {
            settings.api_key = std::env::var("API_KEY").ok();
        }
        settings.api_key = settings
            .api_key
            .as_deref()
            .map(normalize_api_key)
            .filter(|k| !k.is_empty());

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }

    /// Batch size as a `usize`, for chunking.
    pub fn batch_size(&self) -> usize {
        usize::from(self.batch_size)
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            model: Some(s.model.clone()),
            batch_size: Some(s.batch_size),
            schema_policy: Some(s.schema_policy),
            skipped_lines: Some(s.skipped_lines),
            output: Some(s.output),
            theme: Some(s.theme.clone()),
        }
    }
}

// ── Helpers ────────────────────────────────────────────────────────────────────

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

/// Trim whitespace and any surrounding ASCII or typographic quotes that often
/// sneak in when a key is pasted from a web console.
pub fn normalize_api_key(raw: &str) -> String {
    fn is_quote(c: char) -> bool {
        matches!(c, '"' | '\'' | '“' | '”' | '‘' | '’')
    }
    raw.trim().trim_matches(is_quote).trim().to_string()
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    fn args(list: &[&str]) -> Vec<std::ffi::OsString> {
        list.iter().map(|s| (*s).into()).collect()
    }

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            model: Some("gemini-2.5-pro".to_string()),
            batch_size: Some(25),
            schema_policy: Some(SchemaPolicy::Lenient),
            skipped_lines: Some(SkippedLinePolicy::Silent),
            output: Some(OutputFormat::Json),
            theme: Some("light".to_string()),
        };
        params.save_to(&path).expect("save");

        let loaded = LastUsedParams::load_from(&path);
        assert_eq!(loaded.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(loaded.batch_size, Some(25));
        assert_eq!(loaded.schema_policy, Some(SchemaPolicy::Lenient));
        assert_eq!(loaded.skipped_lines, Some(SkippedLinePolicy::Silent));
        assert_eq!(loaded.output, Some(OutputFormat::Json));
        assert_eq!(loaded.theme.as_deref(), Some("light"));
    }

    #[test]
    fn test_last_used_params_never_contains_api_key() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        Settings::load_with_last_used_impl(
            args(&["sentinel-chat", "--api-key", "secret-value"]),
            &path,
        );
        let raw = std::fs::read_to_string(&path).expect("persisted file");
        assert!(!raw.contains("secret-value"));
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        LastUsedParams {
            theme: Some("dark".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");
        assert!(path.exists());

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists());
    }

    #[test]
    fn test_last_used_params_default_when_missing_or_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        assert!(LastUsedParams::load_from(&path).model.is_none());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert!(LastUsedParams::load_from(&path).model.is_none());
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["sentinel-chat"]);

        assert!(settings.path.is_none());
        assert!(!settings.analyze);
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.batch_size(), DEFAULT_BATCH_SIZE);
        assert!(settings.max_messages.is_none());
        assert_eq!(settings.schema_policy, SchemaPolicy::Strict);
        assert_eq!(settings.skipped_lines, SkippedLinePolicy::Warn);
        assert_eq!(settings.output, OutputFormat::Text);
        assert_eq!(settings.theme, "auto");
        assert_eq!(settings.width, 80);
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_cli_parsing() {
        let settings = Settings::parse_from([
            "sentinel-chat",
            "chat.txt",
            "--analyze",
            "--batch-size",
            "5",
            "--max-messages",
            "40",
            "--schema-policy",
            "lenient",
            "--output",
            "json",
        ]);
        assert_eq!(settings.path, Some(PathBuf::from("chat.txt")));
        assert!(settings.analyze);
        assert_eq!(settings.batch_size(), 5);
        assert_eq!(settings.max_messages, Some(40));
        assert_eq!(settings.schema_policy, SchemaPolicy::Lenient);
        assert_eq!(settings.output, OutputFormat::Json);
    }

    #[test]
    fn test_settings_rejects_zero_batch_size() {
        let result = Settings::try_parse_from(["sentinel-chat", "--batch-size", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_with_last_used_merges_persisted_values() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        LastUsedParams {
            model: Some("gemini-2.5-flash".to_string()),
            output: Some(OutputFormat::Json),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(args(&["sentinel-chat"]), &path);
        assert_eq!(settings.model, "gemini-2.5-flash");
        assert_eq!(settings.output, OutputFormat::Json);
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        LastUsedParams {
            theme: Some("dark".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            args(&["sentinel-chat", "--theme", "light"]),
            &path,
        );
        assert_eq!(settings.theme, "light");
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        LastUsedParams {
            theme: Some("plain".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");

        Settings::load_with_last_used_impl(args(&["sentinel-chat", "--clear"]), &path);
        assert!(!path.exists());
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let settings = Settings::load_with_last_used_impl(
            args(&["sentinel-chat", "--debug"]),
            &tmp_config_path(&tmp),
        );
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_with_last_used_persists_after_run() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        Settings::load_with_last_used_impl(
            args(&["sentinel-chat", "--batch-size", "30"]),
            &path,
        );
        assert_eq!(LastUsedParams::load_from(&path).batch_size, Some(30));
    }

    #[test]
    fn test_normalize_api_key_strips_quotes() {
        assert_eq!(normalize_api_key("  \"abc123\" "), "abc123");
        assert_eq!(normalize_api_key("“abc123”"), "abc123");
        assert_eq!(normalize_api_key("abc123"), "abc123");
    }
}
