use std::{path::Path, process, sync::Arc};

use prerender_recache::{
    application::error::AppError,
    config,
    infra::{aws, error::InfraError, http, telemetry},
};
use tokio::io::AsyncReadExt;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(|err| {
        AppError::from(InfraError::configuration(format!(
            "failed to load configuration: {err}"
        )))
    })?;

    let command = cli_args.into_command();

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Invoke(args) => run_invoke(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let service = aws::build_recache_service(&settings.aws, &settings.recache).await;
    let state = http::RecacheState::new(Arc::new(service));
    let router = http::build_router(state, settings.server.max_request_bytes.get());

    info!(
        target = "prerender_recache::serve",
        bucket = %settings.recache.bucket,
        "starting recache server"
    );

    http::serve(&settings.server, router)
        .await
        .map_err(AppError::from)
}

async fn run_invoke(settings: config::Settings, args: config::InvokeArgs) -> Result<(), AppError> {
    let body = read_request_body(&args.file).await?;
    let service = aws::build_recache_service(&settings.aws, &settings.recache).await;

    let outcome = service.handle(&body).await?;
    let envelope = outcome
        .invocation_response()
        .and_then(|response| serde_json::to_string(&response))
        .map_err(|err| AppError::unexpected(format!("failed to encode response: {err}")))?;
    println!("{envelope}");

    Ok(())
}

async fn read_request_body(path: &Path) -> Result<Vec<u8>, AppError> {
    if path == Path::new("-") {
        let mut buffer = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut buffer)
            .await
            .map_err(InfraError::from)?;
        return Ok(buffer);
    }

    tokio::fs::read(path)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))
}
