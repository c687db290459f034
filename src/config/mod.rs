//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::{
    AwsOverrides, CliArgs, Command, InvokeArgs, PipelineOverrides, ServeArgs, ServeOverrides,
};

use std::{net::SocketAddr, num::NonZeroUsize, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "recache";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_MAX_REQUEST_BYTES: u64 = 1024 * 1024;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub aws: AwsSettings,
    pub recache: RecacheSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
    pub max_request_bytes: NonZeroUsize,
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

#[derive(Debug, Clone, Default)]
pub struct AwsSettings {
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
}

/// Targets of the recache pipeline.
#[derive(Debug, Clone)]
pub struct RecacheSettings {
    pub queue_url: String,
    pub bucket: String,
    pub token_secret_id: String,
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

    builder = builder.add_source(Environment::with_prefix("RECACHE").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Invoke(args)) => {
            raw.apply_pipeline_overrides(&args.pipeline);
            raw.apply_aws_overrides(&args.aws);
        }
        None => raw.apply_serve_overrides(&cli.serve),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    aws: RawAwsSettings,
    recache: RawRecacheSettings,
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
        if let Some(limit) = overrides.server_max_request_bytes {
            self.server.max_request_bytes = Some(limit);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }

        self.apply_pipeline_overrides(&overrides.pipeline);
        self.apply_aws_overrides(&overrides.aws);
    }

    fn apply_pipeline_overrides(&mut self, overrides: &PipelineOverrides) {
        if let Some(url) = overrides.queue_url.as_ref() {
            self.recache.queue_url = Some(url.clone());
        }
        if let Some(bucket) = overrides.bucket.as_ref() {
            self.recache.bucket = Some(bucket.clone());
        }
        if let Some(secret) = overrides.token_secret_id.as_ref() {
            self.recache.token_secret_id = Some(secret.clone());
        }
    }

    fn apply_aws_overrides(&mut self, overrides: &AwsOverrides) {
        if let Some(region) = overrides.region.as_ref() {
            self.aws.region = Some(region.clone());
        }
        if let Some(endpoint) = overrides.endpoint_url.as_ref() {
            self.aws.endpoint_url = Some(endpoint.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            aws,
            recache,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let aws = build_aws_settings(aws);
        let recache = build_recache_settings(recache)?;

        Ok(Self {
            server,
            logging,
            aws,
            recache,
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

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    let max_request_bytes_value = server
        .max_request_bytes
        .unwrap_or(DEFAULT_MAX_REQUEST_BYTES);
    let max_request_bytes = usize::try_from(max_request_bytes_value)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| {
            LoadError::invalid(
                "server.max_request_bytes",
                "must be greater than zero and fit in usize",
            )
        })?;

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
        max_request_bytes,
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

fn build_aws_settings(aws: RawAwsSettings) -> AwsSettings {
    AwsSettings {
        region: non_blank(aws.region),
        endpoint_url: non_blank(aws.endpoint_url),
    }
}

fn build_recache_settings(recache: RawRecacheSettings) -> Result<RecacheSettings, LoadError> {
    let queue_url = non_blank(recache.queue_url)
        .ok_or_else(|| LoadError::invalid("recache.queue_url", "a queue URL is required"))?;
    let bucket = non_blank(recache.bucket)
        .ok_or_else(|| LoadError::invalid("recache.bucket", "a bucket name is required"))?;
    let token_secret_id = non_blank(recache.token_secret_id).ok_or_else(|| {
        LoadError::invalid("recache.token_secret_id", "a secret identifier is required")
    })?;

    Ok(RecacheSettings {
        queue_url,
        bucket,
        token_secret_id,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
    max_request_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAwsSettings {
    region: Option<String>,
    endpoint_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRecacheSettings {
    queue_url: Option<String>,
    bucket: Option<String>,
    token_secret_id: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

impl CliArgs {
    /// The command to run; a bare invocation serves with the top-level overrides.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or_else(|| {
            Command::Serve(Box::new(ServeArgs {
                overrides: self.serve,
            }))
        })
    }
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
