use anyhow::{Context, Result};
use clap::Parser;
use motion_cam::{
    create_router, AppState, BrowserPublishAgent, Collaborators, Config, JsonFileSessionStore,
    MotionSensor, NatsNotifier, OpenTokClient, SessionController, SysfsGpioSensor,
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "motion-cam")]
#[command(about = "Motion-triggered camera streaming with SMS alerts")]
struct Args {
    /// Configuration file, without extension
    #[arg(long, default_value = "config/motion-cam")]
    config: String,

    /// Override the public URL used in notification links
    #[arg(long)]
    public_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(public_url) = args.public_url {
        cfg.public_url = public_url;
    }

    info!("Motion Cam v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Viewing links will use {}", cfg.public_url);

    let store = Arc::new(JsonFileSessionStore::open(cfg.store.expanded_path()).await?);
    let video = Arc::new(OpenTokClient::new(cfg.video.clone())?);
    let notifier = Arc::new(NatsNotifier::connect(cfg.notify.clone()).await?);
    let publisher = Arc::new(BrowserPublishAgent::new(cfg.publish.clone()));

    let controller = SessionController::new(
        cfg.session.clone(),
        cfg.public_url.clone(),
        Collaborators {
            video: video.clone(),
            publisher,
            notifier,
            store: store.clone(),
        },
    );

    let state = AppState::new(store, video, controller.subscribe());
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, create_router(state)).await {
            error!("HTTP server stopped: {}", e);
        }
    });

    let mut sensor = SysfsGpioSensor::new(cfg.sensor.clone());
    let events = sensor.start().await?;
    info!("Watching motion via {}", sensor.name());

    controller
        .run(events, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    sensor.stop().await?;

    Ok(())
}
