//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "vitrine";
const ENV_PREFIX: &str = "VITRINE";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3100;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_RENDERER_BASE_URL: &str = "http://127.0.0.1:4000";
const DEFAULT_RENDERER_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RENDERER_BACKOFF_MS: u64 = 500;
const DEFAULT_RENDERER_MIN_HTML_LENGTH: usize = 1000;
const DEFAULT_RENDERER_TIMEOUT_SECS: u64 = 30;
const DEFAULT_THEMES_DIR: &str = "themes";
const DEFAULT_PAGE_TYPE: &str = "product";
const DEFAULT_ASSET_PREFIX: &str = "/theme-assets/";
const DEFAULT_ASSET_PROXY_PREFIX: &str = "/preview/assets/";

/// Command-line arguments for the Vitrine binary.
#[derive(Debug, Parser)]
#[command(name = "vitrine", version, about = "Storefront theme preview server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "VITRINE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the preview HTTP service.
    Serve(Box<ServeArgs>),
    /// Compose a single preview document without starting the server.
    Compose(Box<ComposeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RendererOverrides {
    /// Override the theme renderer base URL.
    #[arg(long = "renderer-base-url", value_name = "URL")]
    pub renderer_base_url: Option<String>,

    /// Override the maximum number of render attempts per preview.
    #[arg(long = "renderer-max-attempts", value_name = "COUNT")]
    pub renderer_max_attempts: Option<u32>,

    /// Override the delay between render attempts.
    #[arg(long = "renderer-backoff-ms", value_name = "MILLISECONDS")]
    pub renderer_backoff_ms: Option<u64>,

    /// Override the renderer request timeout.
    #[arg(long = "renderer-timeout-seconds", value_name = "SECONDS")]
    pub renderer_timeout_seconds: Option<u64>,

    /// Override the directory holding theme folders.
    #[arg(long = "themes-directory", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub themes_directory: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub renderer: RendererOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Clone)]
pub struct ComposeArgs {
    #[command(flatten)]
    pub renderer: RendererOverrides,

    /// Theme directory name.
    #[arg(long, value_name = "THEME")]
    pub theme: String,

    /// JSON file holding the content store.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub content: PathBuf,

    /// Template page type; defaults to `themes.default_page_type`.
    #[arg(long = "page-type", value_name = "TYPE")]
    pub page_type: Option<String>,

    /// Image URL to distribute across sections; repeatable.
    #[arg(long = "image", value_name = "URL")]
    pub images: Vec<String>,

    /// Base URL for documents opened from a non-HTTP origin.
    #[arg(long = "base-url", value_name = "URL")]
    pub base_url: Option<String>,

    /// Write the document here instead of stdout.
    #[arg(long, short, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub renderer: RendererSettings,
    pub themes: ThemeSettings,
    pub preview: PreviewSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct RendererSettings {
    pub base_url: Url,
    pub max_attempts: NonZeroU32,
    pub backoff: Duration,
    pub min_html_length: usize,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ThemeSettings {
    pub directory: PathBuf,
    pub default_page_type: String,
}

#[derive(Debug, Clone)]
pub struct PreviewSettings {
    pub asset_prefix: String,
    pub asset_proxy_prefix: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Compose(args)) => raw.apply_renderer_overrides(&args.renderer),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Parse CLI arguments from the process and load settings.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    renderer: RawRendererSettings,
    themes: RawThemeSettings,
    preview: RawPreviewSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }

        self.apply_renderer_overrides(&overrides.renderer);
    }

    fn apply_renderer_overrides(&mut self, overrides: &RendererOverrides) {
        if let Some(url) = overrides.renderer_base_url.as_ref() {
            self.renderer.base_url = Some(url.clone());
        }
        if let Some(attempts) = overrides.renderer_max_attempts {
            self.renderer.max_attempts = Some(attempts);
        }
        if let Some(backoff) = overrides.renderer_backoff_ms {
            self.renderer.backoff_ms = Some(backoff);
        }
        if let Some(seconds) = overrides.renderer_timeout_seconds {
            self.renderer.timeout_seconds = Some(seconds);
        }
        if let Some(directory) = overrides.themes_directory.as_ref() {
            self.themes.directory = Some(directory.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            renderer,
            themes,
            preview,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let renderer = build_renderer_settings(renderer)?;
        let themes = build_theme_settings(themes)?;
        let preview = build_preview_settings(preview)?;

        Ok(Self {
            server,
            logging,
            renderer,
            themes,
            preview,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr =
        parse_socket_addr(&host, port).map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_renderer_settings(renderer: RawRendererSettings) -> Result<RendererSettings, LoadError> {
    let raw_url = renderer
        .base_url
        .unwrap_or_else(|| DEFAULT_RENDERER_BASE_URL.to_string());
    let base_url = Url::parse(raw_url.trim())
        .map_err(|err| LoadError::invalid("renderer.base_url", format!("failed to parse: {err}")))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "renderer.base_url",
            "scheme must be http or https",
        ));
    }

    let max_attempts = non_zero_u32(
        renderer
            .max_attempts
            .unwrap_or(DEFAULT_RENDERER_MAX_ATTEMPTS)
            .into(),
        "renderer.max_attempts",
    )?;

    let timeout_secs = renderer
        .timeout_seconds
        .unwrap_or(DEFAULT_RENDERER_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "renderer.timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(RendererSettings {
        base_url,
        max_attempts,
        backoff: Duration::from_millis(renderer.backoff_ms.unwrap_or(DEFAULT_RENDERER_BACKOFF_MS)),
        min_html_length: renderer
            .min_html_length
            .unwrap_or(DEFAULT_RENDERER_MIN_HTML_LENGTH),
        timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_theme_settings(themes: RawThemeSettings) -> Result<ThemeSettings, LoadError> {
    let directory = themes
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_THEMES_DIR));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "themes.directory",
            "path must not be empty",
        ));
    }

    let default_page_type = themes
        .default_page_type
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_PAGE_TYPE.to_string());
    if default_page_type.is_empty() {
        return Err(LoadError::invalid(
            "themes.default_page_type",
            "must not be empty",
        ));
    }

    Ok(ThemeSettings {
        directory,
        default_page_type,
    })
}

fn build_preview_settings(preview: RawPreviewSettings) -> Result<PreviewSettings, LoadError> {
    let asset_prefix = preview
        .asset_prefix
        .unwrap_or_else(|| DEFAULT_ASSET_PREFIX.to_string());
    validate_path_prefix(&asset_prefix, "preview.asset_prefix")?;

    let asset_proxy_prefix = preview
        .asset_proxy_prefix
        .unwrap_or_else(|| DEFAULT_ASSET_PROXY_PREFIX.to_string());
    validate_path_prefix(&asset_proxy_prefix, "preview.asset_proxy_prefix")?;

    if asset_prefix == asset_proxy_prefix {
        return Err(LoadError::invalid(
            "preview.asset_proxy_prefix",
            "must differ from preview.asset_prefix",
        ));
    }

    Ok(PreviewSettings {
        asset_prefix,
        asset_proxy_prefix,
    })
}

fn validate_path_prefix(value: &str, key: &'static str) -> Result<(), LoadError> {
    if value.len() < 2 || !value.starts_with('/') || !value.ends_with('/') {
        return Err(LoadError::invalid(
            key,
            "must start and end with `/` and name at least one segment",
        ));
    }
    Ok(())
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("failed to parse `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value = u32::try_from(value)
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRendererSettings {
    base_url: Option<String>,
    max_attempts: Option<u32>,
    backoff_ms: Option<u64>,
    min_html_length: Option<usize>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawThemeSettings {
    directory: Option<PathBuf>,
    default_page_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPreviewSettings {
    asset_prefix: Option<String>,
    asset_proxy_prefix: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
        assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
        assert_eq!(settings.renderer.max_attempts.get(), 3);
        assert_eq!(settings.renderer.backoff, Duration::from_millis(500));
        assert_eq!(settings.renderer.min_html_length, 1000);
        assert_eq!(settings.renderer.base_url.as_str(), "http://127.0.0.1:4000/");
        assert_eq!(settings.themes.default_page_type, "product");
        assert_eq!(settings.preview.asset_prefix, "/theme-assets/");
        assert_eq!(settings.preview.asset_proxy_prefix, "/preview/assets/");
        assert!(matches!(settings.logging.format, LogFormat::Compact));
    }

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.server.port = Some(4000);
        raw.logging.level = Some("info".to_string());

        let overrides = ServeOverrides {
            server_port: Some(4321),
            log_level: Some("debug".to_string()),
            renderer: RendererOverrides {
                renderer_base_url: Some("https://render.internal:9443".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.server.addr.port(), 4321);
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
        assert_eq!(settings.renderer.base_url.port(), Some(9443));
    }

    #[test]
    fn cli_json_logging_enforces_format() {
        let mut raw = RawSettings::default();
        let overrides = ServeOverrides {
            log_json: Some(true),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn zero_attempts_are_rejected() {
        let mut raw = RawSettings::default();
        raw.renderer.max_attempts = Some(0);
        let err = Settings::from_raw(raw).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "renderer.max_attempts",
                ..
            }
        ));
    }

    #[test]
    fn renderer_url_must_be_http() {
        let mut raw = RawSettings::default();
        raw.renderer.base_url = Some("file:///tmp/render".to_string());
        assert!(Settings::from_raw(raw).is_err());

        let mut raw = RawSettings::default();
        raw.renderer.base_url = Some("not a url".to_string());
        assert!(Settings::from_raw(raw).is_err());
    }

    #[test]
    fn asset_prefixes_are_validated() {
        let mut raw = RawSettings::default();
        raw.preview.asset_prefix = Some("theme-assets".to_string());
        assert!(Settings::from_raw(raw).is_err());

        let mut raw = RawSettings::default();
        raw.preview.asset_proxy_prefix = Some("/theme-assets/".to_string());
        let err = Settings::from_raw(raw).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "preview.asset_proxy_prefix",
                ..
            }
        ));
    }

    #[test]
    fn default_to_serve_command() {
        let args = CliArgs::parse_from(["vitrine"]);
        let command = args
            .command
            .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
        assert!(matches!(command, Command::Serve(_)));
    }

    #[test]
    fn parse_serve_overrides() {
        let args = CliArgs::parse_from([
            "vitrine",
            "serve",
            "--server-host",
            "0.0.0.0",
            "--renderer-base-url",
            "http://renderer:4000",
        ]);

        match args.command.expect("serve command") {
            Command::Serve(serve) => {
                assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
                assert_eq!(
                    serve.overrides.renderer.renderer_base_url.as_deref(),
                    Some("http://renderer:4000")
                );
            }
            _ => panic!("wrong command parsed"),
        }
    }

    #[test]
    fn parse_compose_arguments() {
        let args = CliArgs::parse_from([
            "vitrine",
            "compose",
            "--theme",
            "dawn",
            "--content",
            "/tmp/content.json",
            "--image",
            "https://cdn.example.com/a.jpg",
            "--image",
            "https://cdn.example.com/b.jpg",
            "--themes-directory",
            "/srv/themes",
            "-o",
            "/tmp/preview.html",
        ]);

        match args.command.expect("compose command") {
            Command::Compose(compose) => {
                assert_eq!(compose.theme, "dawn");
                assert_eq!(compose.content, std::path::Path::new("/tmp/content.json"));
                assert_eq!(compose.images.len(), 2);
                assert_eq!(
                    compose.output.as_deref(),
                    Some(std::path::Path::new("/tmp/preview.html"))
                );
                assert_eq!(
                    compose.renderer.themes_directory.as_deref(),
                    Some(std::path::Path::new("/srv/themes"))
                );
            }
            _ => panic!("wrong command parsed"),
        }
    }
}
