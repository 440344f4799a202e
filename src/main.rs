use std::{process, sync::Arc};

use rehive::{
    application::{
        chrome::ChromeService, error::AppError, feed::FeedService, page::PageService,
        repos::PostsRepo,
    },
    config,
    infra::{
        assets::AssetUrlBuilder,
        cms::DirectusClient,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
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
        error!(error = %error, "rehive stopped");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "rehive failed to start");
    });
}

async fn run() -> Result<(), AppError> {
    let (_cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    let state = build_http_state(&settings)?;
    serve_http(&settings, state).await
}

fn build_http_state(settings: &config::Settings) -> Result<HttpState, AppError> {
    let posts: Arc<dyn PostsRepo> = Arc::new(DirectusClient::new(&settings.cms)?);
    let assets = AssetUrlBuilder::new(settings.cms.public_url.clone());

    Ok(HttpState {
        feed: Arc::new(FeedService::new(posts, assets, settings.site.clone())),
        pages: Arc::new(PageService::new(&settings.site)),
        chrome: Arc::new(ChromeService::new(settings.site.clone())),
    })
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|source| InfraError::Bind {
            addr: settings.server.addr,
            source,
        })?;

    info!(
        target = "rehive::serve",
        addr = %settings.server.addr,
        cms = %settings.cms.url,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InfraError::Serve)?;

    info!(target = "rehive::serve", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(
            target = "rehive::serve",
            error = %err,
            "failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
}
