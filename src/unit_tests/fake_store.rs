// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use kube::Resource;
use kube_core::ErrorResponse;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::common::ObjectKey;
use crate::error::StoreError;
use crate::store::ObjectStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Get,
    Create,
    Update,
    UpdateStatus,
}

/// Failure injected into the next call of one `Op`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Conflict,
    Timeout,
    Unavailable,
}

/// A write the fake store accepted, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Write<K> {
    Create(K),
    Update(K),
    UpdateStatus(K),
}

struct State<K> {
    objects: BTreeMap<ObjectKey, K>,
    writes: Vec<Write<K>>,
    faults: HashMap<Op, Fault>,
    next_version: u64,
}

/// In-memory API server for one kind. Assigns resource versions on every
/// write and rejects updates carrying a stale one, like the real thing.
pub struct FakeStore<K> {
    state: Mutex<State<K>>,
}

impl<K> FakeStore<K>
where
    K: Resource<DynamicType = ()> + Clone,
{
    pub fn new() -> Self {
        FakeStore {
            state: Mutex::new(State {
                objects: BTreeMap::new(),
                writes: Vec::new(),
                faults: HashMap::new(),
                next_version: 1,
            }),
        }
    }

    /// Seeds an object as if someone else had written it. Not recorded.
    pub fn insert(&self, mut obj: K) -> K {
        let mut state = self.state.lock();
        let version = state.next_version;
        state.next_version += 1;
        obj.meta_mut().resource_version = Some(version.to_string());
        state.objects.insert(key_of(&obj), obj.clone());
        obj
    }

    pub fn remove(&self, key: &ObjectKey) {
        self.state.lock().objects.remove(key);
    }

    pub fn object(&self, key: &ObjectKey) -> Option<K> {
        self.state.lock().objects.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().objects.len()
    }

    pub fn writes(&self) -> Vec<Write<K>> {
        self.state.lock().writes.clone()
    }

    pub fn fail_next(&self, op: Op, fault: Fault) {
        self.state.lock().faults.insert(op, fault);
    }

    fn check_fault(state: &mut State<K>, op: Op, key: &ObjectKey) -> Result<(), StoreError> {
        let kind = K::kind(&()).to_string();
        match state.faults.remove(&op) {
            None => Ok(()),
            Some(Fault::Conflict) => Err(StoreError::Conflict {
                kind,
                key: key.clone(),
            }),
            Some(Fault::Timeout) => Err(StoreError::Timeout {
                kind,
                key: key.clone(),
                timeout: Duration::from_secs(30),
            }),
            Some(Fault::Unavailable) => Err(StoreError::Api(kube::Error::Api(ErrorResponse {
                status: "Failure".to_string(),
                message: "the server is currently unable to handle the request".to_string(),
                reason: "ServiceUnavailable".to_string(),
                code: 503,
            }))),
        }
    }

    fn write(&self, op: Op, obj: &K) -> Result<K, StoreError> {
        let key = key_of(obj);
        let kind = K::kind(&()).to_string();
        let mut state = self.state.lock();
        Self::check_fault(&mut state, op, &key)?;

        let existing = state.objects.get(&key).cloned();
        match (op, existing) {
            (Op::Create, Some(_)) => return Err(StoreError::AlreadyExists { kind, key }),
            (Op::Update | Op::UpdateStatus, None) => return Err(StoreError::NotFound { kind, key }),
            (Op::Update | Op::UpdateStatus, Some(current)) => {
                let sent = obj.meta().resource_version.as_ref();
                if sent.is_some() && sent != current.meta().resource_version.as_ref() {
                    return Err(StoreError::Conflict { kind, key });
                }
            }
            _ => {}
        }

        let mut stored = obj.clone();
        let version = state.next_version;
        state.next_version += 1;
        stored.meta_mut().resource_version = Some(version.to_string());
        if stored.meta().uid.is_none() {
            stored.meta_mut().uid = Some(format!("uid-{}-{}", key.name, version));
        }
        state.objects.insert(key, stored.clone());
        state.writes.push(match op {
            Op::Create => Write::Create(obj.clone()),
            Op::UpdateStatus => Write::UpdateStatus(obj.clone()),
            _ => Write::Update(obj.clone()),
        });
        Ok(stored)
    }
}

fn key_of<K: Resource>(obj: &K) -> ObjectKey {
    ObjectKey::new(
        obj.meta().namespace.clone().unwrap_or_default(),
        obj.meta().name.clone().unwrap_or_default(),
    )
}

#[async_trait]
impl<K> ObjectStore<K> for FakeStore<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync,
{
    async fn get(&self, key: &ObjectKey) -> Result<K, StoreError> {
        let mut state = self.state.lock();
        Self::check_fault(&mut state, Op::Get, key)?;
        state
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: K::kind(&()).to_string(),
                key: key.clone(),
            })
    }

    async fn create(&self, obj: &K) -> Result<K, StoreError> {
        self.write(Op::Create, obj)
    }

    async fn update(&self, obj: &K) -> Result<K, StoreError> {
        self.write(Op::Update, obj)
    }

    async fn update_status(&self, obj: &K) -> Result<K, StoreError> {
        self.write(Op::UpdateStatus, obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::ConfigMap;
    use kube::api::ObjectMeta;

    fn cm(rv: Option<&str>) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some("cm".to_string()),
                namespace: Some("ns1".to_string()),
                resource_version: rv.map(str::to_string),
                ..ObjectMeta::default()
            },
            ..ConfigMap::default()
        }
    }

    #[tokio::test]
    async fn test_stale_update_conflicts() {
        let store = FakeStore::<ConfigMap>::new();
        let seeded = store.insert(cm(None));
        let updated = store.update(&seeded).await.unwrap();
        assert_ne!(updated.metadata.resource_version, seeded.metadata.resource_version);

        let err = store.update(&seeded).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_injected_fault_fires_once() {
        let store = FakeStore::<ConfigMap>::new();
        store.fail_next(Op::Get, Fault::Unavailable);
        let key = ObjectKey::new("ns1", "cm");
        assert!(matches!(store.get(&key).await, Err(StoreError::Api(_))));
        assert!(store.get(&key).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_create_twice_already_exists() {
        let store = FakeStore::<ConfigMap>::new();
        store.create(&cm(None)).await.unwrap();
        assert!(matches!(
            store.create(&cm(None)).await,
            Err(StoreError::AlreadyExists { .. })
        ));
        assert_eq!(store.len(), 1);
    }
}
