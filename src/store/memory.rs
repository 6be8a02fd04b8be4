//! In-process [`ClusterStore`].
//!
//! Holds objects in a map and records every call so tests can assert how
//! many round trips an admission decision made. Failures can be injected
//! per operation to exercise the error paths.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use kube::core::{ApiResource, DynamicObject, ErrorResponse};

use super::ClusterStore;
use crate::{Error, Result};

/// Store operation kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StoreOp {
    Get,
    List,
    Create,
    Delete,
}

/// A recorded store call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreCall {
    pub op: StoreOp,
    /// Plural resource name, e.g. `vpcs`
    pub resource: String,
    pub namespace: Option<String>,
    /// Object name, `None` for list calls
    pub name: Option<String>,
}

type ObjectKey = (String, Option<String>, String);

#[derive(Default)]
struct Inner {
    objects: BTreeMap<ObjectKey, DynamicObject>,
    calls: Vec<StoreCall>,
    failing: BTreeSet<StoreOp>,
}

/// In-memory cluster store
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

fn resource_key(resource: &ApiResource) -> String {
    if resource.group.is_empty() {
        resource.plural.clone()
    } else {
        format!("{}.{}", resource.plural, resource.group)
    }
}

fn api_error(code: u16, reason: &str, message: String) -> Error {
    Error::Kube(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message,
        reason: reason.to_string(),
        code,
    }))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned map is still a usable map
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed an object. Its kind and namespace come from the object itself.
    pub fn insert(&self, object: DynamicObject) {
        let types = object.types.clone().unwrap_or_default();
        let (group, version) = match types.api_version.split_once('/') {
            Some((group, version)) => (group.to_string(), version.to_string()),
            None => (String::new(), types.api_version.clone()),
        };
        let resource = ApiResource {
            group,
            version,
            api_version: types.api_version.clone(),
            kind: types.kind.clone(),
            plural: format!("{}s", types.kind.to_lowercase()),
        };
        let key = (
            resource_key(&resource),
            object.metadata.namespace.clone(),
            object.metadata.name.clone().unwrap_or_default(),
        );
        self.lock().objects.insert(key, object);
    }

    /// Make every subsequent call of `op` fail with a server error
    pub fn fail_on(&self, op: StoreOp) {
        self.lock().failing.insert(op);
    }

    /// Stop failing calls of `op`
    pub fn recover(&self, op: StoreOp) {
        self.lock().failing.remove(&op);
    }

    /// Calls made so far, in order
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    /// Number of calls of one kind made so far
    pub fn count(&self, op: StoreOp) -> usize {
        self.lock().calls.iter().filter(|c| c.op == op).count()
    }

    /// Current copy of a stored object
    pub fn object(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Option<DynamicObject> {
        let key = (
            resource_key(resource),
            namespace.map(str::to_string),
            name.to_string(),
        );
        self.lock().objects.get(&key).cloned()
    }

    fn record(
        inner: &mut Inner,
        op: StoreOp,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: Option<&str>,
    ) -> Result<()> {
        inner.calls.push(StoreCall {
            op,
            resource: resource.plural.clone(),
            namespace: namespace.map(str::to_string),
            name: name.map(str::to_string),
        });
        if inner.failing.contains(&op) {
            return Err(api_error(
                500,
                "InternalError",
                format!("injected {:?} failure for {}", op, resource.plural),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterStore for MemoryStore {
    async fn get(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<DynamicObject>> {
        let mut inner = self.lock();
        Self::record(&mut inner, StoreOp::Get, resource, namespace, Some(name))?;
        let key = (
            resource_key(resource),
            namespace.map(str::to_string),
            name.to_string(),
        );
        Ok(inner.objects.get(&key).cloned())
    }

    async fn list(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>> {
        let mut inner = self.lock();
        Self::record(&mut inner, StoreOp::List, resource, namespace, None)?;
        let wanted = resource_key(resource);
        Ok(inner
            .objects
            .iter()
            .filter(|((res, ns, _), _)| {
                *res == wanted && (namespace.is_none() || ns.as_deref() == namespace)
            })
            .map(|(_, obj)| obj.clone())
            .collect())
    }

    async fn create(
        &self,
        resource: &ApiResource,
        object: &DynamicObject,
    ) -> Result<DynamicObject> {
        let name = object.metadata.name.clone().unwrap_or_default();
        let namespace = object.metadata.namespace.clone();
        let mut inner = self.lock();
        Self::record(
            &mut inner,
            StoreOp::Create,
            resource,
            namespace.as_deref(),
            Some(&name),
        )?;
        let key = (resource_key(resource), namespace, name.clone());
        if inner.objects.contains_key(&key) {
            return Err(api_error(
                409,
                "AlreadyExists",
                format!("{} {:?} already exists", resource.plural, name),
            ));
        }
        inner.objects.insert(key, object.clone());
        Ok(object.clone())
    }

    async fn delete(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<()> {
        let mut inner = self.lock();
        Self::record(&mut inner, StoreOp::Delete, resource, namespace, Some(name))?;
        let key = (
            resource_key(resource),
            namespace.map(str::to_string),
            name.to_string(),
        );
        match inner.objects.remove(&key) {
            Some(_) => Ok(()),
            None => Err(api_error(
                404,
                "NotFound",
                format!("{} {:?} not found", resource.plural, name),
            )),
        }
    }
}
