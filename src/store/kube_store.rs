//! [`ClusterStore`] backed by the Kubernetes API server.

use async_trait::async_trait;
use kube::Client;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::core::{ApiResource, DynamicObject};
use tracing::{debug, info};

use super::ClusterStore;
use crate::Result;

/// Dynamic client shared by all admission calls.
///
/// Built once at startup; cloning the inner [`Client`] is cheap and shares
/// the underlying connection pool.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    /// Wrap an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, resource: &ApiResource, namespace: Option<&str>) -> Api<DynamicObject> {
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, resource),
            None => Api::all_with(self.client.clone(), resource),
        }
    }
}

#[async_trait]
impl ClusterStore for KubeStore {
    async fn get(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<DynamicObject>> {
        debug!(resource = %resource.plural, ?namespace, name, "GET");
        Ok(self.api(resource, namespace).get_opt(name).await?)
    }

    async fn list(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>> {
        debug!(resource = %resource.plural, ?namespace, "LIST");
        let list = self
            .api(resource, namespace)
            .list(&ListParams::default())
            .await?;
        Ok(list.items)
    }

    async fn create(
        &self,
        resource: &ApiResource,
        object: &DynamicObject,
    ) -> Result<DynamicObject> {
        let namespace = object.metadata.namespace.as_deref();
        let created = self
            .api(resource, namespace)
            .create(&PostParams::default(), object)
            .await?;
        info!(
            resource = %resource.plural,
            name = ?created.metadata.name,
            "Created object"
        );
        Ok(created)
    }

    async fn delete(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<()> {
        self.api(resource, namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        info!(resource = %resource.plural, ?namespace, name, "Deleted object");
        Ok(())
    }
}
