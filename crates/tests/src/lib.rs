//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（mock 世界 → ingestion → 告警引擎 → CSV）

#[cfg(test)]
mod contract_tests {
    use contracts::{AdasConfig, AudioCue, SinkType};

    #[test]
    fn test_default_config_round_trips_through_loader() {
        let toml = config_loader::ConfigLoader::to_toml(&AdasConfig::default()).unwrap();
        let config = config_loader::ConfigLoader::load_from_str(
            &toml,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        assert_eq!(config.simulator.port, 2000);
        assert_eq!(config.sinks.len(), 1);
        assert_eq!(config.sinks[0].sink_type, SinkType::Csv);

        let engine = config.to_alert_engine_config(&[AudioCue::Lane]);
        assert_eq!(engine.enabled_cues, vec![AudioCue::Lane]);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    use actor_factory::{
        ActorFactory, GroundTruthClassifier, MockConfig, MockSimulator, SimulatorClient,
        LANE_WIDTH_M,
    };
    use alert_engine::{AlertEngine, TickInput, TickOutcome};
    use contracts::{
        ActorId, AdasConfig, AlertLevel, AudioCue, CameraPosition, RecordKind, RuntimeGraph,
        SinkConfig, SinkType, Vector3,
    };
    use ingestion::IngestionPipeline;
    use observability::{AlertMetricsAggregator, TickSample};

    fn rig_config(dir: &Path) -> AdasConfig {
        let mut config = AdasConfig::default();
        config.simulator.traffic_vehicles = 0;
        config.detection.skip_frames = 1;
        config.sinks = vec![SinkConfig {
            name: "detections".to_string(),
            sink_type: SinkType::Csv,
            queue_capacity: 128,
            params: HashMap::from([("dir".to_string(), dir.to_string_lossy().into_owned())]),
        }];
        config
    }

    struct Rig {
        factory: ActorFactory<MockSimulator>,
        graph: RuntimeGraph,
        ego: ActorId,
        ingestion: IngestionPipeline,
    }

    async fn spawn_rig(config: &AdasConfig) -> Rig {
        let mut client = MockSimulator::with_config(MockConfig {
            seed: Some(11),
            ..Default::default()
        });
        client.connect("localhost", 2000).await.unwrap();

        let factory = ActorFactory::new(client);
        let graph = factory.spawn_rig(config).await.unwrap();
        let ego = graph.ego.unwrap();

        let mut ingestion = IngestionPipeline::new();
        for (sensor_id, handle) in &graph.sensors {
            let source = factory
                .client()
                .sensor_source(handle.actor_id, sensor_id.clone(), handle.sensor_type)
                .unwrap();
            ingestion
                .register_sensor_source(sensor_id.clone(), source)
                .unwrap();
        }
        ingestion.start_all();

        Rig {
            factory,
            graph,
            ego,
            ingestion,
        }
    }

    impl Rig {
        async fn wait_for_camera(&self, camera: CameraPosition) {
            let frames = self.ingestion.frames();
            for _ in 0..200 {
                if frames.live_cameras().contains(&camera) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            panic!("no frame from {camera:?} camera");
        }

        async fn step(&self, engine: &mut AlertEngine) -> TickOutcome {
            let world = self.factory.client().tick(self.ego).await.unwrap();
            let lane_events = self.ingestion.drain_lane_events();
            engine.tick(
                TickInput {
                    now: world.timestamp,
                    ego: &world.ego,
                    agents: &world.agents,
                    lane_events: &lane_events,
                },
                self.ingestion.frames().as_ref(),
            )
        }
    }

    fn engine_for(config: &AdasConfig, simulator: &MockSimulator) -> AlertEngine {
        AlertEngine::new(
            config.to_alert_engine_config(&AudioCue::ALL),
            Arc::new(GroundTruthClassifier::new(
                simulator.world(),
                config.cameras.fov,
            )),
        )
    }

    fn csv_file(dir: &Path) -> PathBuf {
        let files: Vec<PathBuf> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().is_some_and(|e| e == "csv"))
            .collect();
        assert_eq!(files.len(), 1, "expected exactly one CSV log");
        files[0].clone()
    }

    /// End-to-end: mock world -> IngestionPipeline -> AlertEngine -> Dispatcher CSV
    ///
    /// 验证完整的数据流：
    /// 1. 右后方车辆被右侧相机看到，右盲区通道升级
    /// 2. 自车变道，车道通道立即 Warn
    /// 3. 每个上升沿只播放一次音频
    /// 4. 所有记录写入 CSV，关闭后 actor 全部销毁
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_mock_session() {
        let dir = tempfile::tempdir().unwrap();
        let config = rig_config(dir.path());
        let rig = spawn_rig(&config).await;
        let mut engine = engine_for(&config, rig.factory.client());
        let mut dispatcher = dispatcher::start_dispatcher(config.sinks.clone(), 256)
            .await
            .unwrap();
        let mut aggregator = AlertMetricsAggregator::new();

        let mut observe = |outcome: &TickOutcome, dispatcher: &mut dispatcher::DispatcherHandle| {
            aggregator.update(&TickSample {
                dt: config.simulator.fixed_delta_seconds,
                snapshot: outcome.snapshot,
                nearest_distance_m: outcome.proximity.distance_m(),
                detections_run: outcome.detections_run,
                audio_cues: &outcome.audio_cues,
                records: outcome.records.len(),
                tick_duration_ms: None,
            });
            for record in outcome.records.clone() {
                assert!(dispatcher.send(record));
            }
        };

        // Empty road: everything clear
        let outcome = rig.step(&mut engine).await;
        assert_eq!(outcome.snapshot.overall, AlertLevel::Clear);
        assert!(outcome.records.is_empty());
        observe(&outcome, &mut dispatcher);

        // Vehicle in the right rear quarter, one lane over
        rig.factory
            .client()
            .place_vehicle("car", Vector3::new(-5.0, 3.5, 0.0), 0.0);
        rig.wait_for_camera(CameraPosition::Left).await;
        rig.wait_for_camera(CameraPosition::Right).await;

        let outcome = rig.step(&mut engine).await;
        assert_eq!(outcome.detections_run, 2);
        assert_ne!(outcome.snapshot.right, AlertLevel::Clear);
        assert_eq!(outcome.snapshot.left, AlertLevel::Clear);
        assert_eq!(outcome.snapshot.proximity, AlertLevel::Warn);
        assert_eq!(outcome.snapshot.overall, AlertLevel::Warn);
        assert!(outcome.audio_cues.contains(&AudioCue::Proximity));
        assert!(outcome
            .records
            .iter()
            .any(|r| r.kind == RecordKind::Detection && r.label.as_deref() == Some("car")));
        observe(&outcome, &mut dispatcher);

        // Held warning: no repeated cue
        let outcome = rig.step(&mut engine).await;
        assert!(!outcome.audio_cues.contains(&AudioCue::Proximity));
        observe(&outcome, &mut dispatcher);

        // Ego changes lane
        rig.factory
            .client()
            .set_position(rig.ego, Vector3::new(0.0, LANE_WIDTH_M, 0.0))
            .unwrap();
        let outcome = rig.step(&mut engine).await;
        observe(&outcome, &mut dispatcher);

        let mut lane_outcome = None;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let outcome = rig.step(&mut engine).await;
            observe(&outcome, &mut dispatcher);
            if outcome.snapshot.lane == AlertLevel::Warn {
                lane_outcome = Some(outcome);
                break;
            }
        }
        let outcome = lane_outcome.expect("lane event never reached the engine");
        assert!(outcome.snapshot.lane_active());
        assert_eq!(outcome.snapshot.overall, AlertLevel::Warn);
        assert_eq!(outcome.audio_cues.iter().filter(|c| **c == AudioCue::Lane).count(), 1);
        assert!(outcome.records.iter().any(|r| r.kind == RecordKind::Lane));

        rig.ingestion.stop_all();
        let report = rig.factory.teardown(&rig.graph).await;
        assert!(report.is_clean());
        assert!(dispatcher.close().await);
        assert_eq!(dispatcher.dropped(), 0);

        let summary = aggregator.summary();
        assert!(summary.detector_invocations >= 2);
        assert_eq!(aggregator.audio_cues.get(&AudioCue::Lane), Some(&1));

        let contents = std::fs::read_to_string(csv_file(dir.path())).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some(dispatcher::sinks::CSV_HEADER));
        let rows: Vec<&str> = lines.collect();
        assert_eq!(rows.len() as u64, summary.records);
        assert!(rows.iter().any(|r| r.contains(",car,0.9,right,")));
        assert!(rows.iter().any(|r| r.split(',').nth(5) == Some("true")));
    }

    /// Lane crossings are latched between ticks and not lost when the engine is slow
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_lane_events_latched_between_ticks() {
        let dir = tempfile::tempdir().unwrap();
        let config = rig_config(dir.path());
        let rig = spawn_rig(&config).await;

        // establish the starting lane, then cross twice before draining
        rig.factory.client().tick(rig.ego).await.unwrap();
        for y in [LANE_WIDTH_M, 0.0] {
            rig.factory
                .client()
                .set_position(rig.ego, Vector3::new(0.0, y, 0.0))
                .unwrap();
            rig.factory.client().tick(rig.ego).await.unwrap();
        }

        let mut events = Vec::new();
        for _ in 0..100 {
            events.extend(rig.ingestion.drain_lane_events());
            if events.len() >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(events.len(), 2);
        assert!(events[0].frame_id < events[1].frame_id);
        assert!(rig.ingestion.drain_lane_events().is_empty());
        assert_eq!(rig.ingestion.metrics().snapshot().lane_events, 2);

        rig.ingestion.stop_all();
        assert!(rig.factory.teardown(&rig.graph).await.is_clean());
    }

    /// Teardown destroys every actor, even after a failed step
    #[tokio::test]
    async fn test_teardown_after_tick_failure() {
        let config = rig_config(Path::new("unused"));
        let mut client = MockSimulator::with_config(MockConfig {
            fail_tick_at: Some(1),
            ..Default::default()
        });
        client.connect("localhost", 2000).await.unwrap();
        let factory = ActorFactory::new(client);
        let graph = factory.spawn_rig(&config).await.unwrap();
        let ego = graph.ego.unwrap();

        assert!(factory.client().tick(ego).await.is_err());

        let report = factory.teardown(&graph).await;
        assert!(report.is_clean());
        assert_eq!(report.destroyed, graph.sensors.len() + 1);
        assert_eq!(factory.client().actor_count(), 0);
    }
}
