use async_trait::async_trait;
use oxide_studio::{
    ChannelNotifier, ConfirmOutcome, ConfirmationHandler, GatePhase, GenerationRun, PipelineKind,
    ResetListener, ReviewOutcome, SessionResetHandler, Settings, Studio,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

/// Hands confirmed topics to the test as a pipeline launcher would
struct Launcher {
    tx: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl ConfirmationHandler for Launcher {
    async fn confirm(&self, topic: &str) -> anyhow::Result<()> {
        self.tx.send(topic.to_string())?;
        Ok(())
    }
}

#[derive(Default)]
struct CountingReset {
    resets: AtomicUsize,
}

impl SessionResetHandler for CountingReset {
    fn reset(&self) -> anyhow::Result<()> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct Draft {
    text: Mutex<String>,
}

impl ResetListener for Draft {
    fn name(&self) -> &'static str {
        "draft"
    }

    fn on_reset(&self) {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[tokio::test]
async fn full_generation_session() -> anyhow::Result<()> {
    let settings = Settings::default();
    let (launch_tx, mut launches) = mpsc::unbounded_channel();
    let (notifier, mut notices) = ChannelNotifier::channel(settings.notification_capacity);
    let reset = Arc::new(CountingReset::default());
    let draft = Arc::new(Draft::default());

    let studio = Studio::new(
        &settings,
        Arc::new(Launcher { tx: launch_tx }),
        reset.clone(),
        Arc::new(notifier),
    );
    studio.reset_broadcast().register(draft.clone());

    // Topic selection is gated behind confirmation
    studio.gate().select("solar energy");
    assert!(launches.try_recv().is_err());
    assert_eq!(
        studio.gate().confirm().await?,
        ConfirmOutcome::Confirmed("solar energy".into())
    );
    assert_eq!(studio.gate().phase(), GatePhase::Idle);
    assert_eq!(launches.try_recv().ok().as_deref(), Some("solar energy"));

    // The launched pipeline stages images while it runs
    let (run, handle) = GenerationRun::start(PipelineKind::Single);
    studio.controller().track(handle);
    studio.staging().stage("http://img/1.png", "sunset", 0);
    draft
        .text
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push_str("Solar energy is");

    assert!(studio.controller().stop_all().single);
    assert!(run.is_stop_requested());
    // A late result after the stop request is still accepted
    studio.staging().stage("http://img/2.png", "dawn", 3);
    run.finish();
    assert!(!studio.controller().any_generating());

    assert_eq!(
        studio.staging().request_review(),
        ReviewOutcome::Opened { count: 2 }
    );
    studio.staging().close_review();

    studio.controller().reset_session()?;
    assert_eq!(reset.resets.load(Ordering::SeqCst), 1);
    assert!(draft
        .text
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .is_empty());

    studio.staging().clear();
    assert_eq!(studio.staging().request_review(), ReviewOutcome::Empty);
    assert!(notices.try_recv().is_ok());
    assert!(notices.try_recv().is_err());
    Ok(())
}
