//! Process-wide state: every component the pipeline touches, built once at
//! startup and torn down after the shutdown grace period.

use std::sync::atomic::AtomicI64;
use std::sync::Arc;

use anyhow::Result;
use pulseiq_emotion::{EmotionClassifier, PulseAggregator};
use pulseiq_events::{DashboardHub, EventBus, SessionSocketRegistry};
use pulseiq_identity::{HttpIdentityView, IdentityResolver, IdentityView, StaticIdentityView};
use pulseiq_intervention::InterventionEngine;
use pulseiq_models::Config;
use pulseiq_outcome::{ColdLogWriter, HotSnapshotStore, OutcomeRecorder, OutcomeSink};
use pulseiq_session::SessionStore;
use tokio::sync::Mutex;

pub struct AppContext {
    config: Config,
    store: Arc<SessionStore>,
    classifier: Arc<EmotionClassifier>,
    engine: Arc<InterventionEngine>,
    resolver: Arc<IdentityResolver>,
    bus: Arc<EventBus>,
    hub: Arc<DashboardHub>,
    registry: Arc<SessionSocketRegistry>,
    hot: Arc<HotSnapshotStore>,
    recorder: Arc<OutcomeRecorder>,
    pulse: Arc<Mutex<PulseAggregator>>,
    /// Epoch seconds of the sweeper's last pass, for health reporting.
    sweeper_heartbeat: AtomicI64,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("shards", &self.store.shard_count())
            .field("active_sessions", &self.store.active_sessions())
            .field("dashboards", &self.hub.connection_count())
            .finish_non_exhaustive()
    }
}

impl AppContext {
    #[must_use]
    pub fn builder(config: Config) -> AppContextBuilder {
        AppContextBuilder::new(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn classifier(&self) -> &Arc<EmotionClassifier> {
        &self.classifier
    }

    pub fn engine(&self) -> &Arc<InterventionEngine> {
        &self.engine
    }

    pub fn resolver(&self) -> &Arc<IdentityResolver> {
        &self.resolver
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn hub(&self) -> &Arc<DashboardHub> {
        &self.hub
    }

    pub fn registry(&self) -> &Arc<SessionSocketRegistry> {
        &self.registry
    }

    pub fn hot(&self) -> &Arc<HotSnapshotStore> {
        &self.hot
    }

    pub fn recorder(&self) -> &Arc<OutcomeRecorder> {
        &self.recorder
    }

    pub fn pulse(&self) -> &Arc<Mutex<PulseAggregator>> {
        &self.pulse
    }

    pub fn sweeper_heartbeat(&self) -> &AtomicI64 {
        &self.sweeper_heartbeat
    }
}

pub struct AppContextBuilder {
    config: Config,
    identity_view: Option<Arc<dyn IdentityView>>,
    outcome_sink: Option<Arc<dyn OutcomeSink>>,
}

impl std::fmt::Debug for AppContextBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContextBuilder")
            .field("identity_view", &self.identity_view.is_some())
            .field("outcome_sink", &self.outcome_sink.is_some())
            .finish_non_exhaustive()
    }
}

impl AppContextBuilder {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            identity_view: None,
            outcome_sink: None,
        }
    }

    /// Override the identity view (tests, embedded deployments).
    #[must_use]
    pub fn with_identity_view(mut self, view: Arc<dyn IdentityView>) -> Self {
        self.identity_view = Some(view);
        self
    }

    /// Override the cold outcome sink.
    #[must_use]
    pub fn with_outcome_sink(mut self, sink: Arc<dyn OutcomeSink>) -> Self {
        self.outcome_sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<AppContext> {
        let config = self.config;
        config.validate()?;

        let identity_view: Arc<dyn IdentityView> = match self.identity_view {
            Some(view) => view,
            None => match &config.identity_store_url {
                Some(url) => Arc::new(HttpIdentityView::new(url.clone())?),
                None => Arc::new(StaticIdentityView::empty()),
            },
        };

        let outcome_sink: Arc<dyn OutcomeSink> = self.outcome_sink.unwrap_or_else(|| {
            Arc::new(ColdLogWriter::new(config.outcome_log_dir.clone()))
        });

        let hot = Arc::new(HotSnapshotStore::new());
        let recorder = Arc::new(OutcomeRecorder::new(Arc::clone(&hot), outcome_sink));

        Ok(AppContext {
            store: Arc::new(SessionStore::new(config.shards, config.session_idle_ms)),
            classifier: Arc::new(EmotionClassifier::new(config.classifier.clone())),
            engine: Arc::new(InterventionEngine::new(config.intervention.clone())),
            resolver: Arc::new(IdentityResolver::new(identity_view)),
            bus: Arc::new(EventBus::new()),
            hub: Arc::new(DashboardHub::new()),
            registry: Arc::new(SessionSocketRegistry::new()),
            hot,
            recorder,
            pulse: Arc::new(Mutex::new(PulseAggregator::new())),
            sweeper_heartbeat: AtomicI64::new(0),
            config,
        })
    }
}
