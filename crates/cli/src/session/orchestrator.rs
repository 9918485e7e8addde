//! Session orchestrator - coordinates all components.
//!
//! Connect → spawn rig → subscribe sensors → fixed-rate main loop → teardown.
//! Every exit path, including a failed simulation step, goes through
//! [`SessionResources::cleanup`].

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use actor_factory::{ActorFactory, ActorFactoryError, SimulatorClient, TeardownReport};
use alert_engine::{AlertEngine, TickInput};
use anyhow::{Context, Result};
use contracts::{
    ActorId, AdasConfig, AudioCue, AudioSink, Classifier, ControlSource, DashboardRenderer,
    DashboardView, RenderControl, RuntimeGraph, VehicleControl,
};
use dispatcher::DispatcherHandle;
use ingestion::IngestionPipeline;
use observability::{record_tick_duration_ms, TickSample};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument, warn};

use super::SessionStats;
use crate::error::CliError;

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub config: AdasConfig,

    /// Stop after this many ticks (None = until quit)
    pub max_ticks: Option<u64>,

    /// Capacity of the dispatcher input queue
    pub record_queue: usize,
}

/// Everything outside the engine the loop talks to
pub struct Collaborators {
    pub classifier: Arc<dyn Classifier>,
    pub audio: Box<dyn AudioSink>,
    /// Cues the audio sink can actually play
    pub available_cues: Vec<AudioCue>,
    pub renderer: Box<dyn DashboardRenderer>,
    pub control: Box<dyn ControlSource>,
}

/// Why the main loop ended
#[derive(Debug)]
pub enum ExitReason {
    Quit,
    RendererQuit,
    Signal,
    MaxTicks,
    TickFailed {
        tick: u64,
        error: ActorFactoryError,
    },
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Quit => "quit",
            ExitReason::RendererQuit => "renderer quit",
            ExitReason::Signal => "signal",
            ExitReason::MaxTicks => "max ticks",
            ExitReason::TickFailed { .. } => "tick failed",
        }
    }
}

/// One dashboard session against a simulator
pub struct Session<C: SimulatorClient> {
    config: SessionConfig,
    client: C,
}

impl<C: SimulatorClient> Session<C> {
    pub fn new(config: SessionConfig, client: C) -> Self {
        Self { config, client }
    }

    /// Run until quit, renderer quit, Ctrl+C/SIGTERM, `max_ticks` or a tick error.
    pub async fn run(self, collaborators: Collaborators) -> Result<SessionStats> {
        self.run_until(collaborators, shutdown_signal()).await
    }

    /// Like [`run`](Self::run), with `shutdown` standing in for the OS signals.
    #[instrument(name = "session_run", skip_all)]
    pub async fn run_until(
        self,
        mut collaborators: Collaborators,
        shutdown: impl Future<Output = ()>,
    ) -> Result<SessionStats> {
        let SessionConfig {
            config,
            max_ticks,
            record_queue,
        } = self.config;
        let mut client = self.client;
        let sim = &config.simulator;

        info!(host = %sim.host, port = sim.port, "Connecting to simulator...");
        client
            .connect(&sim.host, sim.port)
            .await
            .map_err(|e| CliError::simulator_connection(&sim.host, sim.port, e))?;
        client
            .apply_world_settings(sim.synchronous_mode, sim.fixed_delta_seconds)
            .await
            .context("Failed to apply world settings")?;

        let mut dispatcher = dispatcher::start_dispatcher(config.sinks.clone(), record_queue)
            .await
            .context("Failed to create dispatcher")?;
        info!(sinks = config.sinks.len(), "Dispatcher started");

        let factory = ActorFactory::new(client);
        let graph = match factory.spawn_rig(&config).await {
            Ok(graph) => graph,
            Err(e) => {
                dispatcher.close().await;
                return Err(e).context("Failed to spawn actors");
            }
        };
        info!(
            sensors = graph.sensors.len(),
            traffic = graph.traffic.len(),
            "Actors spawned successfully"
        );

        let mut resources = SessionResources {
            factory: &factory,
            graph,
            ingestion: IngestionPipeline::new(),
            dispatcher,
            teardown: None,
        };

        let mut stats = SessionStats::default();
        let ego = match resources.attach_sensors() {
            Ok(active) => {
                stats.active_sensors = active;
                resources.graph.ego
            }
            Err(e) => {
                resources.cleanup().await;
                return Err(e);
            }
        };
        let Some(ego) = ego else {
            resources.cleanup().await;
            anyhow::bail!("Rig has no ego vehicle");
        };

        let engine_config = config.to_alert_engine_config(&collaborators.available_cues);
        let mut engine = AlertEngine::new(engine_config, Arc::clone(&collaborators.classifier));

        resources.ingestion.start_all();
        info!(
            target_fps = config.main_loop.target_fps,
            max_ticks = ?max_ticks,
            "Session running"
        );

        let started = Instant::now();
        let exit = resources
            .drive(
                ego,
                &config,
                max_ticks,
                &mut engine,
                &mut collaborators,
                &mut stats,
                shutdown,
            )
            .await;
        stats.duration = started.elapsed();

        info!(reason = exit.as_str(), ticks = stats.ticks(), "Shutting down session...");
        stats.exit = exit.as_str().to_string();
        stats.ingestion = resources.ingestion.metrics().snapshot();
        stats.teardown = resources.cleanup().await;
        stats.records_dropped = resources.dispatcher.dropped();

        info!(
            ticks = stats.ticks(),
            duration_secs = stats.duration.as_secs_f64(),
            fps = format!("{:.2}", stats.fps()),
            "Session shutdown complete"
        );

        match exit {
            ExitReason::TickFailed { tick, error } => {
                Err(CliError::simulator_tick(tick, error).into())
            }
            _ => Ok(stats),
        }
    }
}

/// Per-session resources that must be released on every exit path.
///
/// If the loop unwinds, dropping `ingestion` still stops every subscription.
struct SessionResources<'a, C: SimulatorClient> {
    factory: &'a ActorFactory<C>,
    graph: RuntimeGraph,
    ingestion: IngestionPipeline,
    dispatcher: DispatcherHandle,
    teardown: Option<TeardownReport>,
}

impl<C: SimulatorClient> SessionResources<'_, C> {
    /// Register a subscription for every spawned sensor.
    fn attach_sensors(&mut self) -> Result<usize> {
        let client = self.factory.client();
        for (sensor_id, handle) in &self.graph.sensors {
            match client.sensor_source(handle.actor_id, sensor_id.clone(), handle.sensor_type) {
                Some(source) => self
                    .ingestion
                    .register_sensor_source(sensor_id.clone(), source)
                    .with_context(|| format!("Failed to register sensor '{sensor_id}'"))?,
                None => warn!(sensor_id = %sensor_id, "Failed to get sensor source"),
            }
        }
        info!(
            active_sensors = self.ingestion.sensor_count(),
            "Ingestion pipeline configured"
        );
        Ok(self.ingestion.sensor_count())
    }

    #[allow(clippy::too_many_arguments)]
    async fn drive(
        &mut self,
        ego: ActorId,
        config: &AdasConfig,
        max_ticks: Option<u64>,
        engine: &mut AlertEngine,
        collaborators: &mut Collaborators,
        stats: &mut SessionStats,
        shutdown: impl Future<Output = ()>,
    ) -> ExitReason {
        let client = self.factory.client();
        let frames = self.ingestion.frames();

        let mut interval = tokio::time::interval(config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let mut control = VehicleControl::default();
        let mut last_time: Option<f64> = None;

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    warn!("Received shutdown signal, stopping session...");
                    return ExitReason::Signal;
                }
                _ = interval.tick() => {}
            }

            if max_ticks.is_some_and(|max| stats.ticks() >= max) {
                info!(ticks = stats.ticks(), "Reached max ticks limit");
                return ExitReason::MaxTicks;
            }

            let tick_started = Instant::now();

            let intent = collaborators.control.poll(&control);
            if intent.quit {
                return ExitReason::Quit;
            }
            control = control.apply(&intent);
            if let Err(e) = client.apply_control(ego, control).await {
                warn!(error = %e, "Failed to apply control");
            }

            let world = match client.tick(ego).await {
                Ok(world) => world,
                Err(error) => {
                    error!(tick = stats.ticks(), error = %error, "Simulation tick failed");
                    return ExitReason::TickFailed {
                        tick: stats.ticks(),
                        error,
                    };
                }
            };

            let lane_events = self.ingestion.drain_lane_events();
            let outcome = engine.tick(
                TickInput {
                    now: world.timestamp,
                    ego: &world.ego,
                    agents: &world.agents,
                    lane_events: &lane_events,
                },
                frames.as_ref(),
            );

            for &cue in &outcome.audio_cues {
                collaborators.audio.play(cue);
            }

            let view = DashboardView {
                tick: outcome.tick,
                sim_time: world.timestamp,
                alerts: outcome.snapshot,
                speed_kph: world.ego.speed() * 3.6,
                control,
                nearest_distance_m: outcome.proximity.distance_m(),
                live_cameras: frames.live_cameras(),
            };

            let record_count = outcome.records.len();
            for record in outcome.records {
                self.dispatcher.send(record);
            }

            let dt = last_time.map_or(config.simulator.fixed_delta_seconds, |t| {
                world.timestamp - t
            });
            last_time = Some(world.timestamp);

            let tick_ms = tick_started.elapsed().as_secs_f64() * 1000.0;
            record_tick_duration_ms(tick_ms);
            stats.record_tick(&TickSample {
                dt,
                snapshot: outcome.snapshot,
                nearest_distance_m: view.nearest_distance_m,
                detections_run: outcome.detections_run,
                audio_cues: &outcome.audio_cues,
                records: record_count,
                tick_duration_ms: Some(tick_ms),
            });

            if collaborators.renderer.render(&view) == RenderControl::Quit {
                return ExitReason::RendererQuit;
            }
        }
    }

    /// Stop subscriptions, tear actors down, close the dispatcher.
    ///
    /// Safe to call more than once; each step only runs the first time.
    async fn cleanup(&mut self) -> TeardownReport {
        self.ingestion.stop_all();

        let report = match &self.teardown {
            Some(report) => report.clone(),
            None => {
                let report = self.factory.teardown(&self.graph).await;
                if !report.is_clean() {
                    warn!(failed = ?report.failed, "Some actors could not be destroyed");
                }
                self.teardown = Some(report.clone());
                report
            }
        };

        self.dispatcher.close().await;
        report
    }
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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
