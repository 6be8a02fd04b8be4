//! Cluster resource store.
//!
//! The admission core never talks to the API server directly. It goes
//! through [`ClusterStore`], a dynamic get/list/create/delete capability
//! keyed by [`ApiResource`]. Production uses [`KubeStore`] over a single
//! long-lived client; tests use [`MemoryStore`].
//!
//! Every helper here performs exactly one store call. Nothing is cached and
//! nothing is retried: the API server's admission failure policy owns that.

mod kube_store;
mod memory;

pub use kube_store::KubeStore;
pub use memory::{MemoryStore, StoreCall, StoreOp};

use async_trait::async_trait;
use kube::Resource;
use kube::core::{ApiResource, DynamicObject};
use tracing::debug;

use crate::crd::{Subnet, Vpc, Workspace};
use crate::{Error, Result};

/// Dynamic access to cluster resources
#[async_trait]
pub trait ClusterStore: Send + Sync {
    /// Fetch an object, `None` when it does not exist
    async fn get(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<DynamicObject>>;

    /// List objects, cluster wide when `namespace` is `None`
    async fn list(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>>;

    /// Create an object in the namespace recorded in its metadata
    async fn create(
        &self,
        resource: &ApiResource,
        object: &DynamicObject,
    ) -> Result<DynamicObject>;

    /// Delete an object by name
    async fn delete(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<()>;
}

/// ApiResource for a statically typed resource
pub fn api_resource<K: Resource<DynamicType = ()>>() -> ApiResource {
    ApiResource::erase::<K>(&())
}

/// Check whether a KubeSphere workspace exists
pub async fn workspace_exists<S>(store: &S, name: &str) -> Result<bool>
where
    S: ClusterStore + ?Sized,
{
    let found = store
        .get(&api_resource::<Workspace>(), None, name)
        .await?
        .is_some();
    debug!(workspace = %name, found, "Workspace lookup");
    Ok(found)
}

/// CIDR of the subnet allocated to a namespace.
///
/// When several subnets are listed the last one wins. No subnet, or a subnet
/// without a CIDR, is reported as [`Error::SubnetNotFound`].
pub async fn namespace_subnet_cidr<S>(store: &S, namespace: &str) -> Result<String>
where
    S: ClusterStore + ?Sized,
{
    let objects = store
        .list(&api_resource::<Subnet>(), Some(namespace))
        .await?;

    let mut cidr = None;
    for object in objects {
        let subnet: Subnet = serde_json::from_value(serde_json::to_value(object)?)?;
        cidr = Some(subnet.spec.cidr);
    }

    match cidr {
        Some(cidr) if !cidr.trim().is_empty() => Ok(cidr),
        _ => Err(Error::SubnetNotFound(namespace.to_string())),
    }
}

/// Check whether a VPC exists
pub async fn vpc_exists<S>(store: &S, name: &str) -> Result<bool>
where
    S: ClusterStore + ?Sized,
{
    Ok(store
        .get(&api_resource::<Vpc>(), None, name)
        .await?
        .is_some())
}

/// Create a VPC
pub async fn create_vpc<S>(store: &S, vpc: &Vpc) -> Result<()>
where
    S: ClusterStore + ?Sized,
{
    let resource = api_resource::<Vpc>();
    let name = vpc.metadata.name.clone().unwrap_or_default();

    let mut object = DynamicObject::new(&name, &resource);
    object.metadata = vpc.metadata.clone();
    object.data = serde_json::json!({ "spec": serde_json::to_value(&vpc.spec)? });

    store.create(&resource, &object).await?;
    Ok(())
}

/// Delete a VPC by name
pub async fn delete_vpc<S>(store: &S, name: &str) -> Result<()>
where
    S: ClusterStore + ?Sized,
{
    store.delete(&api_resource::<Vpc>(), None, name).await
}
