//! Snapshot loading from a live cluster.
//!
//! Lists daemon sets, deployments and pods through the Kubernetes API and
//! pulls current usage from metrics-server.
//!
//! # Prerequisites
//!
//! - Valid kubeconfig (uses default context or specified context)
//! - RBAC permissions to list workloads and read metrics
//! - metrics-server, for utilization checks (optional)

use crate::cluster::{ClusterSnapshot, PodMetricsItem, PodMetricsList};
use crate::error::{AuditError, Result};
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use k8s_openapi::api::core::v1::Pod;
use kube::{
    Client, Config,
    api::{Api, ListParams},
};
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Reads cluster objects into a [`ClusterSnapshot`].
pub struct LiveLoader {
    client: Client,
}

impl LiveLoader {
    /// Connect using the default kubeconfig.
    pub async fn new() -> Result<Self> {
        install_crypto_provider();
        let config = Config::infer().await?;
        let client = Client::try_from(config)?;
        Ok(Self { client })
    }

    /// Connect using a specific kubeconfig context.
    pub async fn with_context(context: &str) -> Result<Self> {
        install_crypto_provider();
        let kubeconfig = kube::config::Kubeconfig::read()?;
        let config = Config::from_custom_kubeconfig(
            kubeconfig,
            &kube::config::KubeConfigOptions {
                context: Some(context.to_string()),
                ..Default::default()
            },
        )
        .await?;
        let client = Client::try_from(config)?;
        Ok(Self { client })
    }

    /// Load every audited kind, across all namespaces or a single one.
    ///
    /// Missing metrics leave the snapshot without metrics; anything else that
    /// fails to list is an error.
    pub async fn snapshot(&self, namespace: Option<&str>) -> Result<ClusterSnapshot> {
        let mut snapshot = ClusterSnapshot::new();

        for ds in self.list::<DaemonSet>(namespace).await? {
            snapshot.add_daemon_set(ds);
        }
        for dp in self.list::<Deployment>(namespace).await? {
            snapshot.add_deployment(dp);
        }
        for pod in self.list::<Pod>(namespace).await? {
            snapshot.add_pod(pod);
        }

        match self.pod_metrics(namespace).await {
            Ok(items) => {
                for item in items {
                    snapshot.add_pod_metrics(item);
                }
            }
            Err(e) => log::warn!("Pod metrics unavailable: {}", e),
        }

        log::info!(
            "Loaded {} daemon set(s), {} deployment(s), {} pod(s)",
            snapshot.daemon_sets.len(),
            snapshot.deployments.len(),
            snapshot.pods.len()
        );
        Ok(snapshot)
    }

    async fn list<K>(&self, namespace: Option<&str>) -> Result<Vec<K>>
    where
        K: kube::Resource<Scope = NamespaceResourceScope>
            + k8s_openapi::Resource
            + Clone
            + DeserializeOwned
            + Debug,
        K::DynamicType: Default,
    {
        let api: Api<K> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };

        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| AuditError::Listing {
                kind: <K as k8s_openapi::Resource>::KIND,
                message: e.to_string(),
            })?;
        Ok(list.items)
    }

    /// Pod metrics from metrics-server.
    ///
    /// The metrics API is an aggregated API, so this uses a raw request.
    async fn pod_metrics(&self, namespace: Option<&str>) -> Result<Vec<PodMetricsItem>> {
        let path = match namespace {
            Some(ns) => format!("/apis/metrics.k8s.io/v1beta1/namespaces/{}/pods", ns),
            None => "/apis/metrics.k8s.io/v1beta1/pods".to_string(),
        };

        let request = http::Request::builder()
            .method("GET")
            .uri(&path)
            .body(Vec::new())
            .map_err(|e| AuditError::Listing {
                kind: "PodMetrics",
                message: format!("Failed to build request: {}", e),
            })?;

        let response = self
            .client
            .request::<PodMetricsList>(request)
            .await
            .map_err(|e| {
                if e.to_string().contains("404") || e.to_string().contains("not found") {
                    AuditError::MetricsUnavailable
                } else {
                    AuditError::Kube(e)
                }
            })?;

        Ok(response.items)
    }
}

// Required for TLS connections to the API server.
fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}
