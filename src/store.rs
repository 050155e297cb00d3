// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use core::fmt::Debug;
use kube::{
    api::{Api, PostParams},
    Client, Resource,
};
use kube_core::{ErrorResponse, NamespaceResourceScope};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::*;

use crate::common::ObjectKey;
use crate::error::StoreError;

/// Typed access to the backing API store for one kind of namespaced object.
///
/// `update` and `update_status` are conditional: the object carries the
/// resource version it was read at, and a stale version yields
/// `StoreError::Conflict` instead of overwriting a concurrent write.
#[async_trait]
pub trait ObjectStore<K>: Send + Sync
where
    K: Send + Sync,
{
    async fn get(&self, key: &ObjectKey) -> Result<K, StoreError>;
    async fn create(&self, obj: &K) -> Result<K, StoreError>;
    async fn update(&self, obj: &K) -> Result<K, StoreError>;
    async fn update_status(&self, obj: &K) -> Result<K, StoreError>;
}

/// `ObjectStore` backed by the Kubernetes API through kube-rs.
pub struct KubeStore<K> {
    client: Client,
    timeout: Duration,
    _kind: PhantomData<fn() -> K>,
}

impl<K> KubeStore<K> {
    pub fn new(client: Client, timeout: Duration) -> Self {
        KubeStore {
            client,
            timeout,
            _kind: PhantomData,
        }
    }
}

impl<K> KubeStore<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
{
    fn api(&self, namespace: &str) -> Api<K> {
        Api::<K>::namespaced(self.client.clone(), namespace)
    }

    async fn bounded<T, F>(&self, key: &ObjectKey, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, kube::Error>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(res) => res.map_err(|e| kube_error_to_store(e, K::kind(&()).as_ref(), key)),
            Err(_) => Err(StoreError::Timeout {
                kind: K::kind(&()).to_string(),
                key: key.clone(),
                timeout: self.timeout,
            }),
        }
    }
}

#[async_trait]
impl<K> ObjectStore<K> for KubeStore<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + Debug
        + DeserializeOwned
        + Serialize
        + Send
        + Sync
        + 'static,
{
    async fn get(&self, key: &ObjectKey) -> Result<K, StoreError> {
        let api = self.api(&key.namespace);
        self.bounded(key, api.get(&key.name)).await
    }

    async fn create(&self, obj: &K) -> Result<K, StoreError> {
        let key = object_key(obj);
        let api = self.api(&key.namespace);
        self.bounded(&key, api.create(&PostParams::default(), obj))
            .await
    }

    async fn update(&self, obj: &K) -> Result<K, StoreError> {
        let key = object_key(obj);
        let api = self.api(&key.namespace);
        self.bounded(&key, api.replace(&key.name, &PostParams::default(), obj))
            .await
    }

    async fn update_status(&self, obj: &K) -> Result<K, StoreError> {
        let key = object_key(obj);
        let api = self.api(&key.namespace);
        let data = serde_json::to_vec(obj).map_err(StoreError::Encode)?;
        self.bounded(
            &key,
            api.replace_status(&key.name, &PostParams::default(), data),
        )
        .await
    }
}

fn object_key<K: Resource>(obj: &K) -> ObjectKey {
    let meta = obj.meta();
    ObjectKey::new(
        meta.namespace.clone().unwrap_or_default(),
        meta.name.clone().unwrap_or_default(),
    )
}

// kube_error_to_store translates the API error from kube-rs APIs
// into the variants the reconciler branches on.
pub fn kube_error_to_store(error: kube::Error, kind: &str, key: &ObjectKey) -> StoreError {
    let reason = match &error {
        kube_client::Error::Api(ErrorResponse { reason, code, .. }) => {
            if reason == "NotFound" || *code == 404 {
                Some("NotFound")
            } else if reason == "AlreadyExists" {
                Some("AlreadyExists")
            } else if reason == "Conflict" {
                Some("Conflict")
            } else {
                None
            }
        }
        _ => None,
    };
    let (kind, key) = (kind.to_string(), key.clone());
    match reason {
        Some("NotFound") => StoreError::NotFound { kind, key },
        Some("AlreadyExists") => StoreError::AlreadyExists { kind, key },
        Some("Conflict") => {
            debug!("{} {} conflict: {}", kind, key, error);
            StoreError::Conflict { kind, key }
        }
        _ => StoreError::Api(error),
    }
}
