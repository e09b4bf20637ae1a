//! Site configuration module.
//!
//! Handles loading, validating, and merging the `config.toml` file. The file
//! is layered on top of stock defaults: user config need only specify the
//! values it wants to override, and every key it omits keeps its default.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [cms]
//! endpoint = ""                 # Document API root, e.g. https://repo.cdn.prismic.io/api/v2
//! # access_token = "..."        # Also settable via --access-token / SPACETRAVELING_ACCESS_TOKEN
//! page_size = 2                 # Posts per list page ("load more" step)
//! document_type = "post"        # Custom type of blog posts
//!
//! [site]
//! title = "spacetraveling"
//! logo = "/images/logo.svg"
//! assets_dir = "assets"         # Copied verbatim to the output root when present
//!
//! [locale]
//! name = "pt_BR"
//! date_format = "%d %b %Y"
//! edited_format = "* editado em %d %b %Y, às %H:%M"
//! load_more_label = "Carregar mais posts"
//! exit_preview_label = "Sair do modo Preview"
//! previous_post_label = "Post anterior"
//! next_post_label = "Próximo post"
//! not_found_label = "Página não encontrada"
//!
//! [reading]
//! words_per_minute = 200
//!
//! [comments]
//! repo = ""                     # owner/name of the utterances repo; empty disables comments
//! issue_term = "pathname"
//! theme = "github-dark"
//!
//! [preview]
//! exit_url = "/api/exit-preview"
//!
//! [logging]
//! level = "info"                # RUST_LOG takes precedence
//! format = "compact"            # compact | json
//!
//! [colors.light]
//! background = "#ffffff"
//! ...
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Document API connection settings.
    pub cms: CmsConfig,
    /// Site identity (title, logo, static assets).
    pub site: SiteInfo,
    /// Locale and user-facing strings.
    pub locale: LocaleConfig,
    /// Reading-time estimate settings.
    pub reading: ReadingConfig,
    /// Comments widget embed settings.
    pub comments: CommentsConfig,
    /// Preview mode settings.
    pub preview: PreviewConfig,
    /// Diagnostic logging settings.
    pub logging: LoggingConfig,
    /// Color schemes for light and dark modes.
    pub colors: ColorConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cms.page_size == 0 {
            return Err(ConfigError::Validation(
                "cms.page_size must be greater than 0".into(),
            ));
        }
        if self.cms.document_type.trim().is_empty() {
            return Err(ConfigError::Validation(
                "cms.document_type must not be empty".into(),
            ));
        }
        if !self.cms.endpoint.is_empty() {
            url::Url::parse(&self.cms.endpoint).map_err(|e| {
                ConfigError::Validation(format!("cms.endpoint is not a valid URL: {e}"))
            })?;
        }
        if self.reading.words_per_minute == 0 {
            return Err(ConfigError::Validation(
                "reading.words_per_minute must be greater than 0".into(),
            ));
        }
        if chrono::Locale::try_from(self.locale.name.as_str()).is_err() {
            return Err(ConfigError::Validation(format!(
                "locale.name '{}' is not a known locale",
                self.locale.name
            )));
        }
        validate_date_format("locale.date_format", &self.locale.date_format)?;
        validate_date_format("locale.edited_format", &self.locale.edited_format)?;
        if self
            .logging
            .level
            .parse::<tracing::level_filters::LevelFilter>()
            .is_err()
        {
            return Err(ConfigError::Validation(format!(
                "logging.level '{}' must be one of off, error, warn, info, debug, trace",
                self.logging.level
            )));
        }
        Ok(())
    }

    /// The configured endpoint, or an error when it was left empty.
    ///
    /// Only commands that talk to the document API need this; `generate`
    /// and `gen-config` run fine without an endpoint.
    pub fn require_endpoint(&self) -> Result<url::Url, ConfigError> {
        if self.cms.endpoint.is_empty() {
            return Err(ConfigError::Validation(
                "cms.endpoint is required to query the document API".into(),
            ));
        }
        url::Url::parse(&self.cms.endpoint)
            .map_err(|e| ConfigError::Validation(format!("cms.endpoint is not a valid URL: {e}")))
    }

    /// Resolve the configured locale. Validated configs always succeed.
    pub fn chrono_locale(&self) -> chrono::Locale {
        chrono::Locale::try_from(self.locale.name.as_str()).unwrap_or(chrono::Locale::POSIX)
    }
}

fn validate_date_format(key: &str, format: &str) -> Result<(), ConfigError> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::Validation(format!(
            "{key} '{format}' is not a valid strftime format"
        )));
    }
    Ok(())
}

/// Document API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CmsConfig {
    /// Root of the document API (the endpoint that lists refs).
    pub endpoint: String,
    /// Access token for private repositories. Never written to the manifest.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Number of posts per list page.
    pub page_size: u32,
    /// Custom type of the blog post documents.
    pub document_type: String,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            page_size: 2,
            document_type: "post".to_string(),
        }
    }
}

/// Site identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    /// Document title of the post list page.
    pub title: String,
    /// Logo image URL shown in the header.
    pub logo: String,
    /// Directory whose contents are copied to the output root.
    pub assets_dir: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            logo: "/images/logo.svg".to_string(),
            assets_dir: "assets".to_string(),
        }
    }
}

/// Locale and user-facing strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocaleConfig {
    /// POSIX locale name used for month and weekday names.
    pub name: String,
    /// strftime format of publication dates.
    pub date_format: String,
    /// strftime format of the "edited" label.
    pub edited_format: String,
    /// Label of the "load more" button.
    pub load_more_label: String,
    /// Label of the exit-preview button.
    pub exit_preview_label: String,
    /// Caption of the link to the previous post.
    pub previous_post_label: String,
    /// Caption of the link to the next post.
    pub next_post_label: String,
    /// Heading of the not-found page.
    pub not_found_label: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            name: "pt_BR".to_string(),
            date_format: "%d %b %Y".to_string(),
            edited_format: "* editado em %d %b %Y, às %H:%M".to_string(),
            load_more_label: "Carregar mais posts".to_string(),
            exit_preview_label: "Sair do modo Preview".to_string(),
            previous_post_label: "Post anterior".to_string(),
            next_post_label: "Próximo post".to_string(),
            not_found_label: "Página não encontrada".to_string(),
        }
    }
}

/// Reading-time estimate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadingConfig {
    pub words_per_minute: u32,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: crate::assemble::DEFAULT_WORDS_PER_MINUTE,
        }
    }
}

/// utterances comments widget settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommentsConfig {
    /// `owner/name` of the GitHub repo backing the comments. Empty disables the widget.
    pub repo: String,
    /// How a page is mapped to an issue (`pathname`, `url`, `title`, ...).
    pub issue_term: String,
    pub theme: String,
}

impl CommentsConfig {
    pub fn enabled(&self) -> bool {
        !self.repo.trim().is_empty()
    }
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            repo: String::new(),
            issue_term: "pathname".to_string(),
            theme: "github-dark".to_string(),
        }
    }
}

/// Preview mode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    /// Where the exit-preview button points.
    pub exit_url: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            exit_url: "/api/exit-preview".to_string(),
        }
    }
}

/// Output format of diagnostic logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Diagnostic logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default level filter; `RUST_LOG` overrides it.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    /// Light mode color scheme.
    pub light: ColorScheme,
    /// Dark mode color scheme.
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

/// Individual color scheme (light or dark).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    pub background: String,
    pub text: String,
    /// Muted text (post metadata, subtitles).
    pub text_muted: String,
    /// Highlight color (buttons, link hover).
    pub accent: String,
    pub border: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#1a1d23".to_string(),
            text_muted: "#6b6f78".to_string(),
            accent: "#e6467a".to_string(),
            border: "#e0e0e0".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#1a1d23".to_string(),
            text: "#f8f8f8".to_string(),
            text_muted: "#bbbbbb".to_string(),
            accent: "#ff57b2".to_string(),
            border: "#383a41".to_string(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file path.
///
/// A missing file yields the stock defaults. User values are merged on top
/// of the defaults, unknown keys are rejected, and the result is validated.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# spacetraveling configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Document API
# ---------------------------------------------------------------------------
[cms]
# Root of the document API, e.g. "https://your-repo.cdn.prismic.io/api/v2".
# Required by fetch, build, load-more and check.
endpoint = ""

# Access token for private repositories. Prefer the --access-token flag or the
# SPACETRAVELING_ACCESS_TOKEN environment variable over committing it here.
# access_token = ""

# Posts per list page. The "load more" button fetches one more page at a time.
page_size = 2

# Custom type of blog post documents.
document_type = "post"

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
title = "spacetraveling"
logo = "/images/logo.svg"

# Directory copied verbatim to the output root (logo, favicon, fonts).
assets_dir = "assets"

# ---------------------------------------------------------------------------
# Locale
# ---------------------------------------------------------------------------
[locale]
# Locale used for month names in dates.
name = "pt_BR"

# strftime formats.
date_format = "%d %b %Y"
edited_format = "* editado em %d %b %Y, às %H:%M"

load_more_label = "Carregar mais posts"
exit_preview_label = "Sair do modo Preview"
previous_post_label = "Post anterior"
next_post_label = "Próximo post"
not_found_label = "Página não encontrada"

# ---------------------------------------------------------------------------
# Reading time
# ---------------------------------------------------------------------------
[reading]
words_per_minute = 200

# ---------------------------------------------------------------------------
# Comments (utterances)
# ---------------------------------------------------------------------------
[comments]
# GitHub repo as "owner/name". Leave empty to disable comments.
repo = ""
issue_term = "pathname"
theme = "github-dark"

# ---------------------------------------------------------------------------
# Preview mode
# ---------------------------------------------------------------------------
[preview]
exit_url = "/api/exit-preview"

# ---------------------------------------------------------------------------
# Logging (written to stderr; RUST_LOG overrides the level)
# ---------------------------------------------------------------------------
[logging]
level = "info"
# "compact" or "json"
format = "compact"

# ---------------------------------------------------------------------------
# Colors - Light mode (prefers-color-scheme: light)
# ---------------------------------------------------------------------------
[colors.light]
background = "#ffffff"
text = "#1a1d23"
text_muted = "#6b6f78"
accent = "#e6467a"
border = "#e0e0e0"

# ---------------------------------------------------------------------------
# Colors - Dark mode (prefers-color-scheme: dark)
# ---------------------------------------------------------------------------
[colors.dark]
background = "#1a1d23"
text = "#f8f8f8"
text_muted = "#bbbbbb"
accent = "#ff57b2"
border = "#383a41"
"##
}

/// Generate CSS custom properties from color config.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        r#":root {{
    --color-bg: {light_bg};
    --color-text: {light_text};
    --color-text-muted: {light_text_muted};
    --color-accent: {light_accent};
    --color-border: {light_border};
}}

@media (prefers-color-scheme: dark) {{
    :root {{
        --color-bg: {dark_bg};
        --color-text: {dark_text};
        --color-text-muted: {dark_text_muted};
        --color-accent: {dark_accent};
        --color-border: {dark_border};
    }}
}}"#,
        light_bg = colors.light.background,
        light_text = colors.light.text,
        light_text_muted = colors.light.text_muted,
        light_accent = colors.light.accent,
        light_border = colors.light.border,
        dark_bg = colors.dark.background,
        dark_text = colors.dark.text,
        dark_text_muted = colors.dark.text_muted,
        dark_accent = colors.dark.accent,
        dark_border = colors.dark.border,
    )
}
