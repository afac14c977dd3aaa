//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 配置加载 -> 注册 -> 分发 -> 持久化 e2e 测试
//! - 并发分发与 TTL 过期

#[cfg(test)]
mod contract_tests {
    use contracts::records::{AlarmRuleConfig, ProfileTaskRecord, UiTemplate};
    use contracts::{Downsampling, NoneStream, WorkerConfig};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_builtin_kinds_are_distinct() {
        let kinds = [UiTemplate::KIND, AlarmRuleConfig::KIND, ProfileTaskRecord::KIND];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(
            ProfileTaskRecord::definition().descriptor.downsampling,
            Downsampling::Second
        );
    }

    #[test]
    fn test_worker_defaults() {
        let worker = WorkerConfig::default();
        assert_eq!(worker.queue_capacity, 1000);
        assert_eq!(worker.record_ttl_days, 3);
        assert_eq!(worker.ttl_check_interval_secs, 300);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::records::{AlarmRuleConfig, UiTemplate};
    use contracts::{
        DisableRegistry, IngestConfig, ModelRegistry, ModuleContext, NoneStream, ScopeId,
        StreamDefinition, StreamDescriptor, WorkerConfig,
    };
    use dispatcher::{
        create_storage, FileStorage, MemoryStorage, NoneStreamDispatcher, RecordWorker,
        Registration, StorageModels,
    };
    use observability::IngestSummary;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct DisabledWidget {
        id: String,
    }

    impl NoneStream for DisabledWidget {
        const KIND: &'static str = "disabled_widget";

        fn entity_id(&self) -> String {
            self.id.clone()
        }

        fn time_bucket(&self) -> i64 {
            20240101000000
        }
    }

    fn widget_definition() -> StreamDefinition<DisabledWidget> {
        StreamDefinition::json(StreamDescriptor::none_stream(
            "disabled_widget",
            ScopeId(99),
        ))
    }

    fn alarm_rule(name: &str, update_time: i64) -> AlarmRuleConfig {
        AlarmRuleConfig {
            rule_name: name.to_string(),
            expression: "avg(service_resp_time) > 1000".to_string(),
            period: 10,
            silence_period: 0,
            message: String::new(),
            update_time,
        }
    }

    fn now_millis() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as i64
    }

    fn memory_context(storage: &MemoryStorage, worker: WorkerConfig) -> (ModuleContext, Arc<StorageModels>) {
        let models = Arc::new(StorageModels::new());
        let ctx = ModuleContext::builder()
            .storage(Arc::new(storage.clone()))
            .models(models.clone())
            .worker(worker)
            .build();
        (ctx, models)
    }

    /// Config file -> file backend -> register -> dispatch -> drain -> rows on disk
    #[tokio::test]
    async fn test_e2e_file_backend_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let config_path = dir.path().join("ingest.toml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        write!(
            file,
            "disabled_streams = [\"ui_template\"]\n\n[storage]\nbackend = \"file\"\npath = {:?}\n",
            data_dir.display().to_string()
        )
        .unwrap();
        drop(file);

        let config = ConfigLoader::load_from_path(&config_path).unwrap();
        let ctx = ModuleContext::builder()
            .storage(create_storage(&config.storage).unwrap())
            .models(Arc::new(StorageModels::new()))
            .worker(config.worker.clone())
            .build();
        let disabled = Arc::new(DisableRegistry::from_names(
            config.disabled_streams.iter().map(String::as_str),
        ));

        let mut dispatcher = NoneStreamDispatcher::new(disabled);
        assert_eq!(
            dispatcher.register(UiTemplate::definition(), &ctx).unwrap(),
            Registration::Disabled
        );
        assert_eq!(
            dispatcher
                .register(AlarmRuleConfig::definition(), &ctx)
                .unwrap(),
            Registration::Bound
        );

        let dispatcher = Arc::new(dispatcher);
        assert!(dispatcher.dispatch(alarm_rule("svc_resp_time", now_millis())));
        assert!(dispatcher.dispatch(alarm_rule("svc_sla", now_millis())));
        assert!(!dispatcher.dispatch(UiTemplate {
            template_id: "General-Service".into(),
            configuration: "{}".into(),
            activated: true,
            disabled: false,
            update_time: now_millis(),
        }));
        dispatcher.shutdown().await;

        let reader = FileStorage::new(&data_dir).unwrap();
        let rows = reader.rows("alarm_rule_config").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(reader.rows("ui_template").await.unwrap().is_empty());
        assert!(!data_dir.join("ui_template.jsonl").exists());
    }

    /// Registered kind forwards exactly once, to its own worker only
    #[tokio::test]
    async fn test_alarm_rule_forwarded_once() {
        let storage = MemoryStorage::new();
        let (ctx, models) = memory_context(&storage, WorkerConfig::default());
        let mut dispatcher = NoneStreamDispatcher::new(Arc::new(DisableRegistry::new()));
        dispatcher
            .register(AlarmRuleConfig::definition(), &ctx)
            .unwrap();
        dispatcher.register(UiTemplate::definition(), &ctx).unwrap();

        assert!(dispatcher.dispatch(alarm_rule("r1", now_millis())));
        dispatcher.shutdown().await;

        assert_eq!(storage.row_count("alarm_rule_config").await, 1);
        assert_eq!(storage.row_count("ui_template").await, 0);
        assert_eq!(models.models().len(), 2);

        let metrics = dispatcher.metrics();
        let written: Vec<_> = metrics
            .iter()
            .map(|(stream, m)| (stream.as_str(), m.write_count))
            .collect();
        assert_eq!(written, vec![("alarm_rule_config", 1), ("ui_template", 0)]);
    }

    /// Disabled kind: no model, no worker, dispatch stays a no-op
    #[tokio::test]
    async fn test_disabled_widget_suppressed() {
        let storage = MemoryStorage::new();
        let (ctx, models) = memory_context(&storage, WorkerConfig::default());
        let disabled = Arc::new(DisableRegistry::from_names(["disabled_widget"]));
        let mut dispatcher = NoneStreamDispatcher::new(disabled);

        let outcome = dispatcher.register(widget_definition(), &ctx).unwrap();
        assert_eq!(outcome, Registration::Disabled);
        assert!(models.models().is_empty());

        for i in 0..3 {
            assert!(!dispatcher.dispatch(DisabledWidget { id: format!("w-{i}") }));
        }
        assert!(dispatcher.bound_streams().is_empty());
        assert_eq!(storage.row_count("disabled_widget").await, 0);
    }

    /// Never-registered kind has no effect
    #[tokio::test]
    async fn test_unregistered_kind_is_noop() {
        let dispatcher = NoneStreamDispatcher::new(Arc::new(DisableRegistry::new()));
        assert!(!dispatcher.dispatch(DisabledWidget { id: "w".into() }));
        assert!(!dispatcher.is_bound(DisabledWidget::KIND));
    }

    /// Intake tally agrees with what the workers persisted
    #[tokio::test]
    async fn test_ingest_summary_matches_worker_counters() {
        let storage = MemoryStorage::new();
        let (ctx, _models) = memory_context(&storage, WorkerConfig::default());
        let disabled = Arc::new(DisableRegistry::from_names(["disabled_widget"]));
        let mut dispatcher = NoneStreamDispatcher::new(disabled);
        dispatcher.register(AlarmRuleConfig::definition(), &ctx).unwrap();
        dispatcher.register(widget_definition(), &ctx).unwrap();

        let mut summary = IngestSummary::new();
        for i in 0..4 {
            let routed = dispatcher.dispatch(alarm_rule(&format!("r{i}"), now_millis()));
            summary.update(AlarmRuleConfig::KIND, routed);
        }
        let routed = dispatcher.dispatch(DisabledWidget { id: "w".into() });
        summary.update(DisabledWidget::KIND, routed);
        dispatcher.shutdown().await;

        assert_eq!(summary.dispatched, 4);
        assert_eq!(summary.unrouted, 1);
        assert!((summary.routed_rate() - 80.0).abs() < 1e-9);

        let (_, written) = dispatcher
            .metrics()
            .into_iter()
            .find(|(stream, _)| stream == "alarm_rule_config")
            .unwrap();
        assert_eq!(
            summary.per_kind.get(AlarmRuleConfig::KIND),
            Some(&written.write_count)
        );
        assert_eq!(storage.row_count("alarm_rule_config").await, 4);
    }

    /// Second registration replaces the first binding
    #[tokio::test]
    async fn test_double_registration_last_wins() {
        let storage = MemoryStorage::new();
        let (ctx, models) = memory_context(&storage, WorkerConfig::default());
        let mut dispatcher = NoneStreamDispatcher::new(Arc::new(DisableRegistry::new()));

        let outcome = dispatcher
            .register(AlarmRuleConfig::definition(), &ctx)
            .unwrap();
        assert_eq!(outcome, Registration::Bound);
        let first = dispatcher.worker(AlarmRuleConfig::KIND).unwrap();
        let outcome = dispatcher
            .register(AlarmRuleConfig::definition(), &ctx)
            .unwrap();
        assert_eq!(outcome, Registration::Replaced);
        let second = dispatcher.worker(AlarmRuleConfig::KIND).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(models.models().len(), 1);

        dispatcher.dispatch(alarm_rule("r1", now_millis()));
        dispatcher.dispatch(alarm_rule("r2", now_millis()));
        dispatcher.shutdown().await;
        first.shutdown().await;

        assert_eq!(first.metrics().write_count(), 0);
        assert_eq!(second.metrics().write_count(), 2);
        assert_eq!(storage.row_count("alarm_rule_config").await, 2);
    }

    /// Shared dispatcher used from many tasks without locking
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_dispatch() {
        let storage = MemoryStorage::new();
        let (ctx, _) = memory_context(&storage, WorkerConfig::default());
        let mut dispatcher = NoneStreamDispatcher::new(Arc::new(DisableRegistry::new()));
        dispatcher
            .register(AlarmRuleConfig::definition(), &ctx)
            .unwrap();
        let dispatcher = Arc::new(dispatcher);

        let mut handles = Vec::new();
        for task in 0..8 {
            let dispatcher = Arc::clone(&dispatcher);
            handles.push(tokio::spawn(async move {
                for i in 0..50 {
                    assert!(dispatcher.dispatch(alarm_rule(&format!("r-{task}-{i}"), now_millis())));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        dispatcher.shutdown().await;

        assert_eq!(storage.row_count("alarm_rule_config").await, 400);
    }

    /// Keeper removes rows whose bucket is older than the retention window
    #[tokio::test]
    async fn test_ttl_keeper_expires_old_rows() {
        let storage = MemoryStorage::new();
        let worker = WorkerConfig {
            record_ttl_days: 1,
            ttl_check_interval_secs: 1,
            ..Default::default()
        };
        let (ctx, _) = memory_context(&storage, worker);
        let mut dispatcher = NoneStreamDispatcher::new(Arc::new(DisableRegistry::new()));
        dispatcher
            .register(AlarmRuleConfig::definition(), &ctx)
            .unwrap();

        // 2021-01-01T00:00:00Z
        dispatcher.dispatch(alarm_rule("stale", 1_609_459_200_000));
        dispatcher.dispatch(alarm_rule("fresh", now_millis()));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        dispatcher.shutdown().await;

        assert!(storage.get("alarm_rule_config", "stale").await.is_none());
        assert!(storage.get("alarm_rule_config", "fresh").await.is_some());
        let (_, snapshot) = dispatcher.metrics().remove(0);
        assert_eq!(snapshot.expired_count, 1);
    }

    /// Loader output drives the same defaults the dispatcher reads
    #[test]
    fn test_config_json_defaults() {
        let config: IngestConfig =
            ConfigLoader::load_from_str(r#"{"disabled_streams": []}"#, ConfigFormat::Json)
                .unwrap();
        assert_eq!(config.worker, WorkerConfig::default());
    }
}
