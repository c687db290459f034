use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the recache binary.
#[derive(Debug, Parser)]
#[command(
    name = "prerender-recache",
    version,
    about = "Prerender cache invalidation and recache scheduler"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "RECACHE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    // Serve overrides used when no subcommand is given.
    #[command(flatten)]
    pub serve: ServeOverrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve the recache endpoint over HTTP.
    Serve(Box<ServeArgs>),
    /// Run the pipeline once on a request body and print the response.
    Invoke(InvokeArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct InvokeArgs {
    #[command(flatten)]
    pub pipeline: PipelineOverrides,

    #[command(flatten)]
    pub aws: AwsOverrides,

    /// File holding the JSON request body; `-` reads standard input.
    #[arg(value_name = "FILE", default_value = "-", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}

/// Pipeline targets. The environment variable names are the ones the deployed function receives.
#[derive(Debug, Args, Default, Clone)]
pub struct PipelineOverrides {
    /// Override the recache queue URL.
    #[arg(long = "queue-url", env = "SQS_QUEUE_URL", value_name = "URL")]
    pub queue_url: Option<String>,

    /// Override the bucket holding prerendered pages.
    #[arg(long = "cache-bucket", env = "PRERENDER_CACHE_BUCKET", value_name = "BUCKET")]
    pub bucket: Option<String>,

    /// Override the secret holding the token allow-list.
    #[arg(long = "token-secret", env = "TOKEN_SECRET", value_name = "SECRET_ID")]
    pub token_secret_id: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct AwsOverrides {
    /// Override the AWS region.
    #[arg(long = "aws-region", value_name = "REGION")]
    pub region: Option<String>,

    /// Override the AWS endpoint URL, e.g. for a local emulator.
    #[arg(long = "aws-endpoint-url", value_name = "URL")]
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub pipeline: PipelineOverrides,

    #[command(flatten)]
    pub aws: AwsOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the maximum request body size in bytes.
    #[arg(long = "server-max-request-bytes", value_name = "BYTES")]
    pub server_max_request_bytes: Option<u64>,

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
