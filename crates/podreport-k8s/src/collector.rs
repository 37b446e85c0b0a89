//! Pod inventory collection

use anyhow::Result;

use podreport_types::{Inventory, PodRecord};

use crate::config::{KubeSettings, load_kubeconfig, resolve_context};
use crate::source::{KubeSource, PodSource, PodSummary};

/// Walks every namespace of one cluster and records its pods
#[derive(Debug)]
pub struct InventoryCollector<S> {
    source: S,
    cluster: String,
}

impl<S: PodSource> InventoryCollector<S> {
    pub fn new(source: S, cluster: String) -> Self {
        Self { source, cluster }
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// List every namespace, then every pod in each namespace, in API order.
    ///
    /// Any API error aborts the run; no partial inventory is returned.
    pub async fn collect(&self) -> Result<Vec<PodRecord>> {
        tracing::info!("Cluster: {}", self.cluster);

        let namespaces = self.all_namespaces().await?;
        tracing::debug!("Found {} namespaces", namespaces.len());

        let mut records = Vec::new();
        for namespace in &namespaces {
            let mut token: Option<String> = None;
            loop {
                let page = self.source.list_pods(namespace, token.as_deref()).await?;
                for pod in page.items {
                    let record = self.to_record(namespace, pod);
                    tracing::info!("{}/{}: {}", record.namespace, record.name, record.status);
                    records.push(record);
                }
                token = page.continue_token;
                if token.is_none() {
                    break;
                }
            }
        }

        Ok(records)
    }

    async fn all_namespaces(&self) -> Result<Vec<String>> {
        let mut namespaces = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self.source.list_namespaces(token.as_deref()).await?;
            namespaces.extend(page.items);
            token = page.continue_token;
            if token.is_none() {
                return Ok(namespaces);
            }
        }
    }

    fn to_record(&self, namespace: &str, pod: PodSummary) -> PodRecord {
        let mut record = PodRecord::new(self.cluster.clone(), namespace.to_string(), pod.name);
        record.status = pod.phase.unwrap_or_default();
        record.ip = pod.pod_ip;
        record.node = pod.node_name;
        record.created = pod.created;
        record
    }
}

/// Resolve the context described by `settings` and collect its pods.
///
/// A kubeconfig without any contexts yields [`Inventory::no_context`].
pub async fn collect_inventory(settings: &KubeSettings) -> Result<Inventory> {
    let kubeconfig = load_kubeconfig(settings.kubeconfig.as_deref())?;

    let Some(context) = resolve_context(&kubeconfig, settings.context.as_deref())? else {
        tracing::debug!("Kubeconfig defines no contexts");
        return Ok(Inventory::no_context());
    };

    let source = KubeSource::connect(kubeconfig, &context, settings.page_size).await?;
    let collector = InventoryCollector::new(source, context.name);
    let pods = collector.collect().await?;

    Ok(Inventory::new(collector.cluster, pods))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use anyhow::bail;
    use chrono::{TimeZone, Utc};

    use crate::source::ListPage;

    /// In-memory cluster serving pages of `page_size` items
    struct FakeSource {
        namespaces: Vec<(String, Vec<PodSummary>)>,
        page_size: usize,
        failing_namespace: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn new(namespaces: Vec<(&str, Vec<PodSummary>)>) -> Self {
            Self {
                namespaces: namespaces
                    .into_iter()
                    .map(|(ns, pods)| (ns.to_string(), pods))
                    .collect(),
                page_size: usize::MAX,
                failing_namespace: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn paged(mut self, page_size: usize) -> Self {
            self.page_size = page_size;
            self
        }

        fn failing_in(mut self, namespace: &str) -> Self {
            self.failing_namespace = Some(namespace.to_string());
            self
        }

        fn page<T: Clone>(&self, items: &[T], token: Option<&str>) -> ListPage<T> {
            let start: usize = token.map(|t| t.parse().unwrap()).unwrap_or(0);
            let end = start.saturating_add(self.page_size).min(items.len());
            ListPage {
                items: items[start..end].to_vec(),
                continue_token: (end < items.len()).then(|| end.to_string()),
            }
        }
    }

    impl PodSource for FakeSource {
        async fn list_namespaces(&self, continue_token: Option<&str>) -> Result<ListPage<String>> {
            self.calls.lock().unwrap().push("namespaces".to_string());
            let names: Vec<String> = self.namespaces.iter().map(|(ns, _)| ns.clone()).collect();
            Ok(self.page(&names, continue_token))
        }

        async fn list_pods(
            &self,
            namespace: &str,
            continue_token: Option<&str>,
        ) -> Result<ListPage<PodSummary>> {
            self.calls.lock().unwrap().push(format!("pods:{}", namespace));
            if self.failing_namespace.as_deref() == Some(namespace) {
                bail!("Failed to list pods in {}: Unauthorized", namespace);
            }
            let pods = self
                .namespaces
                .iter()
                .find(|(ns, _)| ns == namespace)
                .map(|(_, pods)| pods.as_slice())
                .unwrap_or_default();
            Ok(self.page(pods, continue_token))
        }
    }

    fn running(name: &str) -> PodSummary {
        PodSummary {
            name: name.to_string(),
            phase: Some("Running".to_string()),
            pod_ip: Some("10.0.0.5".to_string()),
            node_name: Some("node-a".to_string()),
            created: Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()),
        }
    }

    fn unscheduled(name: &str) -> PodSummary {
        PodSummary {
            name: name.to_string(),
            phase: Some("Pending".to_string()),
            created: Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 31, 0).unwrap()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_zero_namespaces_yields_no_records() {
        let collector = InventoryCollector::new(FakeSource::new(vec![]), "prod".to_string());
        let records = collector.collect().await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_single_running_pod() {
        let source = FakeSource::new(vec![("default", vec![running("web-1")])]);
        let collector = InventoryCollector::new(source, "prod".to_string());

        let records = collector.collect().await.unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.cluster, "prod");
        assert_eq!(record.namespace, "default");
        assert_eq!(record.name, "web-1");
        assert_eq!(record.status, "Running");
        assert_eq!(record.ip.as_deref(), Some("10.0.0.5"));
        assert_eq!(record.node.as_deref(), Some("node-a"));
        assert_eq!(
            record.created,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_unscheduled_pod_keeps_absent_fields() {
        let source = FakeSource::new(vec![("default", vec![unscheduled("job-0")])]);
        let collector = InventoryCollector::new(source, "prod".to_string());

        let records = collector.collect().await.unwrap();
        assert_eq!(records[0].status, "Pending");
        assert!(records[0].ip.is_none());
        assert!(records[0].node.is_none());
        assert!(records[0].created.is_some());
    }

    #[tokio::test]
    async fn test_missing_phase_becomes_empty_status() {
        let pod = PodSummary {
            name: "fresh".to_string(),
            ..Default::default()
        };
        let source = FakeSource::new(vec![("default", vec![pod])]);
        let collector = InventoryCollector::new(source, "prod".to_string());

        let records = collector.collect().await.unwrap();
        assert_eq!(records[0].status, "");
    }

    #[tokio::test]
    async fn test_preserves_api_order() {
        let source = FakeSource::new(vec![
            ("kube-system", vec![running("coredns"), running("etcd")]),
            ("default", vec![running("web-2"), running("web-1")]),
            ("empty", vec![]),
        ]);
        let collector = InventoryCollector::new(source, "prod".to_string());

        let records = collector.collect().await.unwrap();
        let names: Vec<_> = records
            .iter()
            .map(|r| format!("{}/{}", r.namespace, r.name))
            .collect();
        assert_eq!(
            names,
            [
                "kube-system/coredns",
                "kube-system/etcd",
                "default/web-2",
                "default/web-1",
            ]
        );
    }

    #[tokio::test]
    async fn test_follows_continue_tokens() {
        let pods: Vec<_> = (0..5).map(|i| running(&format!("web-{}", i))).collect();
        let source = FakeSource::new(vec![
            ("a", pods.clone()),
            ("b", vec![]),
            ("c", pods),
        ])
        .paged(2);
        let collector = InventoryCollector::new(source, "prod".to_string());

        let records = collector.collect().await.unwrap();
        assert_eq!(records.len(), 10);
        assert_eq!(records[4].name, "web-4");
        assert_eq!(records[5].namespace, "c");

        let calls = collector.source.calls.lock().unwrap();
        // 3 namespaces in pages of 2, 5 pods in pages of 2 for "a" and "c"
        assert_eq!(calls.iter().filter(|c| *c == "namespaces").count(), 2);
        assert_eq!(calls.iter().filter(|c| *c == "pods:a").count(), 3);
        assert_eq!(calls.iter().filter(|c| *c == "pods:b").count(), 1);
    }

    #[tokio::test]
    async fn test_api_error_is_fatal() {
        let source = FakeSource::new(vec![
            ("default", vec![running("web-1")]),
            ("restricted", vec![running("secret-1")]),
            ("later", vec![running("web-2")]),
        ])
        .failing_in("restricted");
        let collector = InventoryCollector::new(source, "prod".to_string());

        let err = collector.collect().await.unwrap_err();
        assert!(err.to_string().contains("restricted"));

        let calls = collector.source.calls.lock().unwrap();
        assert!(!calls.iter().any(|c| c == "pods:later"));
    }

    #[tokio::test]
    async fn test_collect_is_restartable() {
        let source = FakeSource::new(vec![("default", vec![running("web-1")])]).paged(1);
        let collector = InventoryCollector::new(source, "prod".to_string());

        let first = collector.collect().await.unwrap();
        let second = collector.collect().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_collect_inventory_without_contexts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(
            &path,
            "apiVersion: v1\nkind: Config\nclusters: []\nusers: []\ncontexts: []\n",
        )
        .unwrap();

        let settings = KubeSettings {
            kubeconfig: Some(path),
            ..Default::default()
        };
        let inventory = collect_inventory(&settings).await.unwrap();
        assert!(!inventory.has_context());
        assert!(inventory.is_empty());
    }
}
