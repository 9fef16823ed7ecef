use std::{future::IntoFuture, io::Write, process, sync::Arc, time::Instant};

use serde_json::Value;
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;
use vitrine::{
    application::{error::AppError, preview::PreviewInput},
    config::{self, ComposeArgs, Settings},
    infra::{
        error::InfraError,
        http::{self, HttpState},
        renderer::HttpRenderBackend,
        telemetry,
    },
};
use vitrine_protocol::PreviewRequestBody;

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
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Compose(args) => run_compose(settings, *args).await,
    }
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    let state = HttpState::from_settings(&settings)?;
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "vitrine::serve",
        addr = %settings.server.addr,
        renderer = %settings.renderer.base_url,
        themes = %settings.themes.directory.display(),
        "Preview server listening"
    );

    let draining = Arc::new(Notify::new());
    let signal = draining.clone();
    let mut server = tokio::spawn(
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                signal.notify_one();
            })
            .into_future(),
    );

    let result = tokio::select! {
        result = &mut server => result,
        _ = draining.notified() => {
            info!(
                target = "vitrine::serve",
                grace_seconds = settings.server.graceful_shutdown.as_secs(),
                "Shutdown requested; draining connections"
            );
            match tokio::time::timeout(settings.server.graceful_shutdown, &mut server).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        target = "vitrine::serve",
                        "Graceful shutdown timed out; aborting open connections"
                    );
                    server.abort();
                    return Ok(());
                }
            }
        }
    };

    result
        .map_err(|err| AppError::unexpected(format!("server task failed: {err}")))?
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(target = "vitrine::serve", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(target = "vitrine::serve", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn run_compose(settings: Settings, args: ComposeArgs) -> Result<(), AppError> {
    let raw = tokio::fs::read_to_string(&args.content)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let content: Value = serde_json::from_str(&raw).map_err(|err| {
        AppError::validation(format!(
            "content file `{}` is not valid JSON: {err}",
            args.content.display()
        ))
    })?;

    let mut body = PreviewRequestBody::new(args.theme, content).with_images(args.images);
    if let Some(page_type) = args.page_type {
        body = body.with_page_type(page_type);
    }
    if let Some(base_url) = args.base_url {
        body = body.with_base_url(base_url);
    }
    let input = PreviewInput::from_body(body)?;

    let backend = Arc::new(HttpRenderBackend::new(
        settings.renderer.base_url.clone(),
        settings.renderer.timeout,
    )?);
    let service = http::build_preview_service(&settings, backend);

    let start = Instant::now();
    let document = service.compose(input).await?;

    match args.output.as_ref() {
        Some(path) => tokio::fs::write(path, document.html.as_bytes())
            .await
            .map_err(|err| AppError::from(InfraError::from(err)))?,
        None => std::io::stdout()
            .lock()
            .write_all(document.html.as_bytes())
            .map_err(|err| AppError::from(InfraError::from(err)))?,
    }

    let output = args
        .output
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "stdout".to_string());
    info!(
        target = "vitrine::compose",
        source = document.source.as_str(),
        attempts = document.attempts,
        sections = document.sections.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        output = %output,
        "Preview document written"
    );

    Ok(())
}
