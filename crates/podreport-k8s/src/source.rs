//! Narrow view of the cluster API used by the collector

use std::future::Future;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{Namespace, Pod};
use kube::Api;
use kube::api::ListParams;
use kube::core::ObjectList;
use kube::config::{KubeConfigOptions, Kubeconfig};

use podreport_types::ContextInfo;

/// One page of a list call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    /// Token for the next page, `None` once the listing is complete
    pub continue_token: Option<String>,
}

/// The pod fields the inventory reads
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PodSummary {
    pub name: String,
    pub phase: Option<String>,
    pub pod_ip: Option<String>,
    pub node_name: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

impl From<Pod> for PodSummary {
    fn from(pod: Pod) -> Self {
        let (phase, pod_ip) = pod
            .status
            .map(|s| (s.phase, s.pod_ip))
            .unwrap_or_default();

        Self {
            name: pod.metadata.name.unwrap_or_default(),
            phase,
            pod_ip,
            node_name: pod.spec.and_then(|s| s.node_name),
            created: pod.metadata.creation_timestamp.map(|t| t.0),
        }
    }
}

/// Read-only listing operations on namespaces and pods.
///
/// Each call returns a single page; callers follow `continue_token`.
pub trait PodSource {
    fn list_namespaces(
        &self,
        continue_token: Option<&str>,
    ) -> impl Future<Output = Result<ListPage<String>>> + Send;

    fn list_pods(
        &self,
        namespace: &str,
        continue_token: Option<&str>,
    ) -> impl Future<Output = Result<ListPage<PodSummary>>> + Send;
}

/// [`PodSource`] backed by a live cluster
#[derive(Clone)]
pub struct KubeSource {
    client: kube::Client,
    page_size: Option<u32>,
}

impl std::fmt::Debug for KubeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeSource")
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl KubeSource {
    pub fn new(client: kube::Client, page_size: Option<u32>) -> Self {
        Self { client, page_size }
    }

    /// Create a client for a specific kubeconfig context
    pub async fn connect(
        kubeconfig: Kubeconfig,
        context: &ContextInfo,
        page_size: Option<u32>,
    ) -> Result<Self> {
        let config = kube::Config::from_custom_kubeconfig(
            kubeconfig,
            &KubeConfigOptions {
                context: Some(context.name.clone()),
                ..Default::default()
            },
        )
        .await
        .with_context(|| format!("Failed to create config for context: {}", context.name))?;

        let client = kube::Client::try_from(config)
            .with_context(|| format!("Failed to create client for context: {}", context.name))?;

        Ok(Self::new(client, page_size))
    }

    fn list_params(&self, continue_token: Option<&str>) -> ListParams {
        let mut params = ListParams::default();
        if let Some(limit) = self.page_size {
            params = params.limit(limit);
        }
        if let Some(token) = continue_token {
            params = params.continue_token(token);
        }
        params
    }
}

/// Split a list response into items and the next continuation token
fn into_page<K, T>(list: ObjectList<K>, map: impl FnMut(K) -> T) -> ListPage<T>
where
    K: Clone,
{
    let continue_token = list.metadata.continue_.filter(|t| !t.is_empty());
    ListPage {
        items: list.items.into_iter().map(map).collect(),
        continue_token,
    }
}

impl PodSource for KubeSource {
    async fn list_namespaces(&self, continue_token: Option<&str>) -> Result<ListPage<String>> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let list = namespaces
            .list(&self.list_params(continue_token))
            .await
            .context("Failed to list namespaces")?;

        Ok(into_page(list, |ns| ns.metadata.name.unwrap_or_default()))
    }

    async fn list_pods(
        &self,
        namespace: &str,
        continue_token: Option<&str>,
    ) -> Result<ListPage<PodSummary>> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = pods
            .list(&self.list_params(continue_token))
            .await
            .with_context(|| format!("Failed to list pods in {}", namespace))?;

        Ok(into_page(list, PodSummary::from))
    }
}
