use anyhow::Context;
use async_trait::async_trait;
use dotenvy::dotenv;
use oxide_studio::{
    logging, ChannelNotifier, ConfirmationHandler, GenerationRun, PipelineKind, ResetListener,
    SessionResetHandler, Settings, Studio,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Forwards confirmed topics to the generation launcher
struct LaunchOnConfirm {
    tx: mpsc::Sender<String>,
}

#[async_trait]
impl ConfirmationHandler for LaunchOnConfirm {
    async fn confirm(&self, topic: &str) -> anyhow::Result<()> {
        self.tx
            .send(topic.to_string())
            .await
            .context("generation launcher is gone")
    }
}

struct LogSessionReset;

impl SessionResetHandler for LogSessionReset {
    fn reset(&self) -> anyhow::Result<()> {
        info!("Session state cleared");
        Ok(())
    }
}

struct EditorDraft;

impl ResetListener for EditorDraft {
    fn name(&self) -> &'static str {
        "editor_draft"
    }

    fn on_reset(&self) {
        info!("Editor draft discarded");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    logging::init_tracing().map_err(|e| {
        eprintln!("Failed to compile redaction patterns: {e}");
        e
    })?;

    let settings = init_settings();
    let (notifier, mut notifications) = ChannelNotifier::channel(settings.notification_capacity);
    let (launch_tx, mut launches) = mpsc::channel(1);

    let studio = Arc::new(Studio::new(
        &settings,
        Arc::new(LaunchOnConfirm { tx: launch_tx }),
        Arc::new(LogSessionReset),
        Arc::new(notifier),
    ));
    studio.reset_broadcast().register(Arc::new(EditorDraft));

    info!("Studio controls ready, running demo session");

    studio.gate().select("wind power");
    studio.gate().select("solar energy");
    info!(phase = %serde_json::to_string(&studio.gate().phase())?, "Gate");
    studio.gate().confirm().await?;

    let topic = launches
        .recv()
        .await
        .context("confirmed topic was not delivered")?;

    let single = spawn_pipeline(&studio, PipelineKind::Single, topic.clone(), 2);
    let batch = spawn_pipeline(&studio, PipelineKind::Batch, topic, 10);

    tokio::time::sleep(Duration::from_millis(700)).await;
    let outcome = studio.staging().request_review();
    info!(?outcome, staged = studio.staging().len(), "Review requested");
    studio.staging().close_review();

    let report = studio.controller().stop_all();
    info!(batch = report.batch, single = report.single, "Stop all");

    for task in [single, batch] {
        if let Err(e) = task.await {
            error!(error = %e, "Pipeline task failed");
        }
    }

    studio.controller().reset_session()?;
    studio.staging().clear();
    studio.staging().request_review();

    while let Ok(notification) = notifications.try_recv() {
        info!(notice = %serde_json::to_string(&notification)?, "Notification");
    }

    Ok(())
}

fn init_settings() -> Settings {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            warn!("Failed to load configuration, using defaults: {}", e);
            Settings::default()
        }
    }
}

fn spawn_pipeline(
    studio: &Arc<Studio>,
    kind: PipelineKind,
    topic: String,
    images: i64,
) -> tokio::task::JoinHandle<()> {
    let (run, handle) = GenerationRun::start(kind);
    studio.controller().track(handle);
    let studio = studio.clone();

    tokio::spawn(async move {
        let slug = topic.replace(' ', "-");
        for position in 0..images {
            tokio::select! {
                () = run.cancelled() => {
                    info!(kind = %kind, produced = position, "Pipeline stopped");
                    return;
                }
                () = tokio::time::sleep(Duration::from_millis(250)) => {
                    studio.staging().stage(
                        format!("https://cdn.example/{slug}/{kind}-{position}.png?token=demo"),
                        format!("{topic} ({kind} #{position})"),
                        position,
                    );
                }
            }
        }
        info!(kind = %kind, "Pipeline completed");
        run.finish();
    })
}
