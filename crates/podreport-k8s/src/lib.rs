//! Kubernetes inventory collection for podreport
//!
//! This crate resolves the cluster context from a kubeconfig, hides the
//! Kubernetes object model behind the narrow [`PodSource`] trait, and walks
//! every namespace to produce [`PodRecord`]s.

mod collector;
mod config;
mod source;

pub use collector::{InventoryCollector, collect_inventory};
pub use config::{KubeSettings, list_contexts, load_kubeconfig, resolve_context};
pub use source::{KubeSource, ListPage, PodSource, PodSummary};

// Re-export types that are used in our public API
pub use podreport_types::{ContextInfo, Inventory, PodRecord};
