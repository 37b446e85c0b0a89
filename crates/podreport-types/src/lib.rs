//! Shared types for podreport
//!
//! This crate contains the data structures passed between the collector
//! and the report exporter.

use chrono::{DateTime, Utc};

// ============================================================================
// Kubernetes Resource Types
// ============================================================================

/// Kubernetes context information
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextInfo {
    pub name: String,
    pub cluster: String,
    pub user: String,
    pub namespace: Option<String>,
    pub is_current: bool,
}

impl ContextInfo {
    pub fn new(
        name: String,
        cluster: String,
        user: String,
        namespace: Option<String>,
        is_current: bool,
    ) -> Self {
        Self {
            name,
            cluster,
            user,
            namespace,
            is_current,
        }
    }
}

/// One pod as observed at collection time
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodRecord {
    /// Name of the active context the pod was collected through
    pub cluster: String,
    pub namespace: String,
    pub name: String,
    /// Cluster-reported phase, empty when the cluster has not reported one
    pub status: String,
    pub ip: Option<String>,
    pub node: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

impl PodRecord {
    /// Report columns, in header order
    pub const COLUMNS: [&'static str; 7] = [
        "Cluster",
        "Namespace",
        "Pod Name",
        "Status",
        "IP",
        "Node",
        "Created",
    ];

    pub fn new(cluster: String, namespace: String, name: String) -> Self {
        Self {
            cluster,
            namespace,
            name,
            status: String::new(),
            ip: None,
            node: None,
            created: None,
        }
    }

    /// Cell values in `COLUMNS` order. Absent fields render as empty strings.
    pub fn row(&self) -> [String; 7] {
        [
            self.cluster.clone(),
            self.namespace.clone(),
            self.name.clone(),
            self.status.clone(),
            self.ip.clone().unwrap_or_default(),
            self.node.clone().unwrap_or_default(),
            self.created.as_ref().map(format_timestamp).unwrap_or_default(),
        ]
    }
}

/// Format a creation timestamp as `2024-01-15 10:30:00+00:00`
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%:z").to_string()
}

/// Result of one collection run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    /// Resolved context name, `None` when no context was configured
    pub cluster: Option<String>,
    pub pods: Vec<PodRecord>,
}

impl Inventory {
    pub fn new(cluster: String, pods: Vec<PodRecord>) -> Self {
        Self {
            cluster: Some(cluster),
            pods,
        }
    }

    /// The empty inventory produced when the kubeconfig defines no contexts
    pub fn no_context() -> Self {
        Self::default()
    }

    pub fn has_context(&self) -> bool {
        self.cluster.is_some()
    }

    pub fn len(&self) -> usize {
        self.pods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pods.is_empty()
    }
}
