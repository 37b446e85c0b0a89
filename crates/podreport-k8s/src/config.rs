//! Kubeconfig loading and context resolution

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use kube::config::Kubeconfig;

use podreport_types::ContextInfo;

/// Explicit connection settings handed to the collector
#[derive(Clone, Debug, Default)]
pub struct KubeSettings {
    /// Kubeconfig file to read. `None` uses `KUBECONFIG` / `~/.kube/config`.
    pub kubeconfig: Option<PathBuf>,
    /// Context to use instead of the kubeconfig's `current-context`
    pub context: Option<String>,
    /// Page size for list calls. `None` lets the API server decide.
    pub page_size: Option<u32>,
}

/// Load a kubeconfig from an explicit path or the default locations
pub fn load_kubeconfig(path: Option<&Path>) -> Result<Kubeconfig> {
    match path {
        Some(path) => Kubeconfig::read_from(path)
            .with_context(|| format!("Failed to read kubeconfig from {}", path.display())),
        None => Kubeconfig::read().context("Failed to read kubeconfig. Is kubectl configured?"),
    }
}

/// Get all available contexts from kubeconfig, in file order
pub fn list_contexts(kubeconfig: &Kubeconfig) -> Vec<ContextInfo> {
    kubeconfig
        .contexts
        .iter()
        .map(|ctx| {
            let context = ctx.context.as_ref();
            ContextInfo::new(
                ctx.name.clone(),
                context.map(|c| c.cluster.clone()).unwrap_or_default(),
                context.and_then(|c| c.user.clone()).unwrap_or_default(),
                context.and_then(|c| c.namespace.clone()),
                Some(&ctx.name) == kubeconfig.current_context.as_ref(),
            )
        })
        .collect()
}

/// Pick the context to collect from.
///
/// Returns `Ok(None)` when the kubeconfig defines no contexts at all. A
/// requested or current context that does not exist is an error.
pub fn resolve_context(
    kubeconfig: &Kubeconfig,
    requested: Option<&str>,
) -> Result<Option<ContextInfo>> {
    let contexts = list_contexts(kubeconfig);
    if contexts.is_empty() {
        return Ok(None);
    }

    if let Some(name) = requested {
        let Some(context) = contexts.into_iter().find(|c| c.name == name) else {
            bail!("Context '{}' not found in kubeconfig", name);
        };
        return Ok(Some(context));
    }

    if let Some(current) = kubeconfig.current_context.as_deref() {
        let Some(context) = contexts.into_iter().find(|c| c.is_current) else {
            bail!("Current context '{}' not found in kubeconfig", current);
        };
        return Ok(Some(context));
    }

    let first = contexts.into_iter().next();
    if let Some(context) = &first {
        tracing::warn!(
            "No current-context set in kubeconfig, using first context '{}'",
            context.name
        );
    }
    Ok(first)
}
