//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置文本 -> 插件注册表 -> 中继循环
//! - 投递与 flush 顺序
//! - 跨插件的故障隔离

#[cfg(test)]
mod support {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use contracts::{Flush, Handler, PluginError, Reading, Source};

    /// Shared event journal, one line per plugin call
    pub type Journal = Arc<Mutex<Vec<String>>>;

    pub fn journal() -> Journal {
        Arc::new(Mutex::new(Vec::new()))
    }

    pub fn entries(journal: &Journal) -> Vec<String> {
        journal.lock().unwrap().clone()
    }

    /// Formatted log output of a thread-local subscriber
    #[derive(Clone, Default)]
    pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
            let logs = Self::default();
            let writer = logs.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_writer(move || writer.clone())
                .with_ansi(false)
                .without_time()
                .finish();
            (logs, tracing::subscriber::set_default(subscriber))
        }

        pub fn warnings(&self) -> Vec<String> {
            let bytes = self.0.lock().unwrap();
            String::from_utf8_lossy(&bytes)
                .lines()
                .filter(|line| line.trim_start().starts_with("WARN"))
                .map(str::to_string)
                .collect()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Source emitting the same readings every poll
    pub struct FixedSource {
        pub readings: Vec<Reading>,
    }

    #[async_trait]
    impl Source for FixedSource {
        async fn get_readings(&mut self) -> Result<Vec<Reading>, PluginError> {
            Ok(self.readings.clone())
        }
    }

    /// Source that always fails with the given fault
    pub struct FailingSource {
        pub fatal: bool,
    }

    #[async_trait]
    impl Source for FailingSource {
        async fn get_readings(&mut self) -> Result<Vec<Reading>, PluginError> {
            if self.fatal {
                Err(PluginError::fatal("device gone"))
            } else {
                Err(PluginError::operational("sensor timeout"))
            }
        }
    }

    /// Handler writing every call into the journal
    pub struct JournalHandler {
        pub name: String,
        pub journal: Journal,
        pub flushable: bool,
    }

    #[async_trait]
    impl Handler for JournalHandler {
        async fn set_reading(&mut self, reading: &Reading) -> Result<(), PluginError> {
            let value = reading
                .value()
                .map(|v| v.to_string())
                .unwrap_or_default();
            self.journal.lock().unwrap().push(format!(
                "{} <- {}={}",
                self.name,
                reading.reading_type(),
                value
            ));
            Ok(())
        }

        fn as_flush(&mut self) -> Option<&mut dyn Flush> {
            if self.flushable {
                Some(self)
            } else {
                None
            }
        }
    }

    #[async_trait]
    impl Flush for JournalHandler {
        async fn flush(&mut self) -> Result<(), PluginError> {
            self.journal
                .lock()
                .unwrap()
                .push(format!("{} flushed", self.name));
            Ok(())
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{Handler, Reading, Source};
    use relay::{
        PluginManifest, PluginRegistry, Relay, RelayError, RelayOptions, RelayState,
    };

    use crate::support::{
        entries, journal, CapturedLogs, FailingSource, FixedSource, Journal, JournalHandler,
    };

    fn options(max_cycles: u64) -> RelayOptions {
        RelayOptions {
            poll_interval: Duration::from_millis(1),
            max_cycles: Some(max_cycles),
        }
    }

    fn journal_handler(
        manifest: PluginManifest,
        name: &'static str,
        journal: &Journal,
        flushable: bool,
    ) -> PluginManifest {
        let journal = journal.clone();
        manifest.with_handler(name, move |_| {
            Ok(Box::new(JournalHandler {
                name: name.to_string(),
                journal: journal.clone(),
                flushable,
            }) as Box<dyn Handler>)
        })
    }

    fn fixed_source(
        manifest: PluginManifest,
        name: &'static str,
        readings: Vec<Reading>,
    ) -> PluginManifest {
        manifest.with_source(name, move |_| {
            Ok(Box::new(FixedSource {
                readings: readings.clone(),
            }) as Box<dyn Source>)
        })
    }

    /// One reading, one subscriber: delivered once, then flushed once
    #[tokio::test]
    async fn test_single_reading_delivered_and_flushed() {
        let events = journal();
        let manifest = fixed_source(
            PluginManifest::new(),
            "sensor",
            vec![Reading::with_value("x", 42)],
        );
        let manifest = journal_handler(manifest, "store", &events, true);

        let config = ConfigLoader::load_from_str(
            r#"
[sensor]

[store]
reading_types = "x"
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let registry = PluginRegistry::load(&manifest, &config).unwrap();
        let mut relay = Relay::new(registry, options(1));
        let stats = relay.run_until_stopped().await.unwrap();

        assert_eq!(entries(&events), vec!["store <- x=42", "store flushed"]);
        assert_eq!(stats.cycles, 1);
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.flushed, 1);
        assert_eq!(relay.state(), RelayState::Stopped);
    }

    /// Sources in declaration order, handlers in subscription order,
    /// each handler flushed once at the end
    #[tokio::test]
    async fn test_delivery_and_flush_order() {
        let events = journal();
        let manifest = fixed_source(
            PluginManifest::new(),
            "first",
            vec![Reading::with_value("a", 1)],
        );
        let manifest = fixed_source(manifest, "second", vec![Reading::with_value("b", 2)]);
        let manifest = journal_handler(manifest, "h1", &events, true);
        let manifest = journal_handler(manifest, "h2", &events, true);
        let manifest = journal_handler(manifest, "quiet", &events, false);

        let config = ConfigLoader::load_from_str(
            r#"
[first]
[second]

[h1]
reading_types = "a, b"

[h2]
reading_types = ["b"]

[quiet]
reading_types = "a"
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let registry = PluginRegistry::load(&manifest, &config).unwrap();
        let mut relay = Relay::new(registry, options(2));
        relay.run_until_stopped().await.unwrap();

        let cycle = ["h1 <- a=1", "quiet <- a=1", "h1 <- b=2", "h2 <- b=2"];
        let mut expected: Vec<&str> = cycle.iter().chain(cycle.iter()).copied().collect();
        expected.extend(["h1 flushed", "h2 flushed"]);
        assert_eq!(entries(&events), expected);
    }

    /// A failing source does not keep the others from being delivered
    #[tokio::test]
    async fn test_operational_fault_is_contained() {
        let events = journal();
        let manifest = PluginManifest::new()
            .with_source("broken", |_| {
                Ok(Box::new(FailingSource { fatal: false }) as Box<dyn Source>)
            });
        let manifest = fixed_source(manifest, "healthy", vec![Reading::with_value("t", 3)]);
        let manifest = journal_handler(manifest, "sink", &events, true);

        let config = ConfigLoader::load_from_str(
            r#"{"broken": {}, "healthy": {}, "sink": {"reading_types": "t"}}"#,
            ConfigFormat::Json,
        )
        .unwrap();

        let registry = PluginRegistry::load(&manifest, &config).unwrap();
        let mut relay = Relay::new(registry, options(3));
        let stats = relay.run_until_stopped().await.unwrap();

        assert_eq!(stats.source_failures, 3);
        assert_eq!(stats.delivered, 3);
        assert_eq!(entries(&events).last().unwrap(), "sink flushed");
    }

    /// A fatal fault ends the run before any flush
    #[tokio::test]
    async fn test_fatal_fault_propagates() {
        let events = journal();
        let manifest = PluginManifest::new()
            .with_source("broken", |_| {
                Ok(Box::new(FailingSource { fatal: true }) as Box<dyn Source>)
            });
        let manifest = journal_handler(manifest, "sink", &events, true);

        let config = ConfigLoader::load_from_str(
            "[broken]\n[sink]\nreading_types = \"t\"\n",
            ConfigFormat::Toml,
        )
        .unwrap();

        let registry = PluginRegistry::load(&manifest, &config).unwrap();
        let mut relay = Relay::new(registry, options(3));
        let err = relay.run_until_stopped().await.unwrap_err();

        assert!(matches!(err, RelayError::PluginFatal { ref plugin, .. } if plugin == "broken"));
        assert!(entries(&events).is_empty());
    }

    /// Readings without a value are dropped with one warning, unrouted ones silently
    #[tokio::test]
    async fn test_null_and_unrouted_readings() {
        let (logs, _guard) = CapturedLogs::install();
        let events = journal();
        let manifest = fixed_source(
            PluginManifest::new(),
            "sensor",
            vec![
                Reading::empty("x").with_series_key("attic"),
                Reading::empty("nobody"),
                Reading::with_value("nobody", 1),
                Reading::with_value("x", 5),
            ],
        );
        let manifest = journal_handler(manifest, "store", &events, false);
        let manifest = journal_handler(manifest, "mirror", &events, false);

        let config = ConfigLoader::load_from_str(
            "[sensor]\n[store]\nreading_types = \"x\"\n[mirror]\nreading_types = \"x\"\n",
            ConfigFormat::Toml,
        )
        .unwrap();

        let registry = PluginRegistry::load(&manifest, &config).unwrap();
        let mut relay = Relay::new(registry, options(1));
        let stats = relay.run_until_stopped().await.unwrap();

        assert_eq!(entries(&events), vec!["store <- x=5", "mirror <- x=5"]);
        assert_eq!(stats.null_values, 1);
        assert_eq!(stats.unrouted, 2);
        assert_eq!(stats.flushed, 0);

        let warnings = logs.warnings();
        assert_eq!(warnings.len(), 1, "{warnings:#?}");
        assert!(warnings[0].contains("None value from attic"));
    }

    /// Stopping from another task ends the loop and flushes once
    #[tokio::test]
    async fn test_stop_from_another_task() {
        let events = journal();
        let manifest = fixed_source(
            PluginManifest::new(),
            "sensor",
            vec![Reading::with_value("x", 1)],
        );
        let manifest = journal_handler(manifest, "store", &events, true);

        let config =
            ConfigLoader::load_from_str("[sensor]\n[store]\nreading_types = \"x\"\n", ConfigFormat::Toml)
                .unwrap();

        let registry = PluginRegistry::load(&manifest, &config).unwrap();
        let mut relay = Relay::new(
            registry,
            RelayOptions {
                poll_interval: Duration::from_secs(3600),
                max_cycles: None,
            },
        );
        let handle = relay.shutdown_handle();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.trigger();
        });

        let stats = tokio::time::timeout(Duration::from_secs(5), relay.run_until_stopped())
            .await
            .expect("relay did not stop")
            .unwrap();

        assert_eq!(stats.cycles, 1);
        assert_eq!(entries(&events), vec!["store <- x=1", "store flushed"]);
        assert_eq!(relay.flush_handlers().await.unwrap(), 0);
    }
}

#[cfg(test)]
mod builtin_tests {
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use relay::{builtin_manifest, PluginRegistry, Relay, RelayOptions};

    /// random-source into file-handler, written out at shutdown
    #[tokio::test]
    async fn test_random_source_to_file_handler() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readings.jsonl");

        let content = format!(
            r#"
[random-source]
reading_type = "dice"
min = 1
max = 6

[file-handler]
path = {path:?}
reading_types = "dice"
buffer_size = 100
"#,
            path = path.to_str().unwrap()
        );
        let config = ConfigLoader::load_from_str(&content, ConfigFormat::Toml).unwrap();

        let registry = PluginRegistry::load(&builtin_manifest(), &config).unwrap();
        assert_eq!(registry.source_count(), 1);
        assert_eq!(registry.handler_count(), 1);

        let mut relay = Relay::new(
            registry,
            RelayOptions {
                poll_interval: Duration::from_millis(1),
                max_cycles: Some(3),
            },
        );
        relay.run_until_stopped().await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let values: Vec<i64> = written
            .lines()
            .map(|line| {
                let json: serde_json::Value = serde_json::from_str(line).unwrap();
                assert_eq!(json["reading_type"], "dice");
                json["value"].as_i64().unwrap()
            })
            .collect();

        assert_eq!(values.len(), 3);
        assert!(values.iter().all(|v| (1..=6).contains(v)));
    }

    /// Unconfigured built-ins are skipped, not errors
    #[test]
    fn test_unconfigured_builtins_skipped() {
        let config =
            ConfigLoader::load_from_str("[log-handler]\nreading_types = \"random\"\n", ConfigFormat::Toml)
                .unwrap();
        let registry = PluginRegistry::load(&builtin_manifest(), &config).unwrap();

        assert_eq!(registry.source_count(), 0);
        assert_eq!(registry.handler_count(), 1);
        assert_eq!(registry.handler_names().collect::<Vec<_>>(), vec!["log-handler"]);
    }
}
