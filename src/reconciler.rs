// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use core::fmt::Debug;
use kube::{runtime::controller::Action, Resource};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::*;

use crate::common::ObjectKey;
use crate::config::ControllerConfig;
use crate::error::{BuildError, Error};
use crate::store::ObjectStore;

/// Which part of a managed resource diverged from what its owner asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drift {
    Template,
    Replicas,
    Data,
}

/// Outcome of comparing the expected managed resource with the one in the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan<M> {
    Converged,
    Update { object: M, drift: Drift },
}

/// The per-kind half of a controller. `reconcile_with` supplies the shared
/// control flow: fetch the owner, build, fetch the managed resource, then
/// create, update or leave it alone.
pub trait Reconciler: Send + Sync + 'static {
    type Owner: Resource<DynamicType = ()> + Clone + Debug + Send + Sync + 'static;
    type Managed: Resource<DynamicType = ()> + Clone + Debug + Send + Sync + 'static;

    const NAME: &'static str;
    const OWNER_KIND: &'static str;
    const MANAGED_KIND: &'static str;

    fn managed_key(owner_key: &ObjectKey, owner: &Self::Owner) -> ObjectKey;

    /// Renders the managed resource, owner reference included. Must not do I/O.
    fn build(owner: &Self::Owner) -> Result<Self::Managed, BuildError>;

    /// The returned object keeps the actual's metadata so the update is
    /// conditional on the resource version read in this cycle.
    fn plan(
        expected: &Self::Managed,
        actual: &Self::Managed,
    ) -> Result<Plan<Self::Managed>, BuildError>;

    /// Owner carrying a refreshed status, or `None` when the stored status is current.
    fn observe(owner: &Self::Owner, managed: &Self::Managed) -> Option<Self::Owner>;
}

/// Consecutive failures per object, used by `error_policy` to back off.
#[derive(Debug, Default)]
pub struct Backoff {
    failures: Mutex<HashMap<ObjectKey, u32>>,
}

impl Backoff {
    pub fn record_failure(&self, key: &ObjectKey) -> u32 {
        let mut failures = self.failures.lock();
        let count = failures.entry(key.clone()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn reset(&self, key: &ObjectKey) {
        self.failures.lock().remove(key);
    }

    pub fn failures(&self, key: &ObjectKey) -> u32 {
        self.failures.lock().get(key).copied().unwrap_or(0)
    }
}

// Context is passed to reconcile and error_policy.
// It carries the stores the reconciler reads and writes through.
pub struct Context<R: Reconciler> {
    pub owners: Arc<dyn ObjectStore<R::Owner>>,
    pub managed: Arc<dyn ObjectStore<R::Managed>>,
    pub config: ControllerConfig,
    pub backoff: Backoff,
}

impl<R: Reconciler> Context<R> {
    pub fn new(
        owners: Arc<dyn ObjectStore<R::Owner>>,
        managed: Arc<dyn ObjectStore<R::Managed>>,
        config: ControllerConfig,
    ) -> Self {
        Context {
            owners,
            managed,
            config,
            backoff: Backoff::default(),
        }
    }
}

/// Entry point handed to `kube::runtime::Controller::run`.
pub async fn reconcile<R: Reconciler>(
    owner_from_cache: Arc<R::Owner>,
    ctx: Arc<Context<R>>,
) -> Result<Action, Error> {
    let key = ObjectKey::from_meta(owner_from_cache.meta())?;
    let action = reconcile_with(&key, &ctx).await?;
    ctx.backoff.reset(&key);
    Ok(action)
}

/// One reconcile cycle for `key`. Store errors are returned, never retried here.
#[instrument(skip_all, fields(controller = R::NAME, object = %key))]
pub async fn reconcile_with<R: Reconciler>(
    key: &ObjectKey,
    ctx: &Context<R>,
) -> Result<Action, Error> {
    // Get the owner before taking any reconciliation actions.
    let owner = match ctx.owners.get(key).await {
        Ok(owner) => owner,
        Err(e) if e.is_not_found() => {
            info!("{} {} not found, end reconcile", R::OWNER_KIND, key);
            // A deleted owner is never reconciled again, so its failure count goes too.
            ctx.backoff.reset(key);
            return Ok(Action::await_change());
        }
        Err(e) => {
            return Err(Error::OwnerGetFailed {
                kind: R::OWNER_KIND,
                source: e,
            })
        }
    };

    let expected = R::build(&owner).map_err(|e| {
        error!(
            "Unable to build {} for {} {}: {}",
            R::MANAGED_KIND,
            R::OWNER_KIND,
            key,
            e
        );
        Error::Build(e)
    })?;

    let managed_key = R::managed_key(key, &owner);
    let actual = match ctx.managed.get(&managed_key).await {
        Ok(actual) => actual,
        Err(e) if e.is_not_found() => {
            info!("Create {}: {}", R::MANAGED_KIND, managed_key);
            ctx.managed
                .create(&expected)
                .await
                .map_err(|e| Error::ManagedCreateFailed {
                    kind: R::MANAGED_KIND,
                    source: e,
                })?;
            return Ok(Action::requeue(ctx.config.requeue_after()));
        }
        Err(e) => {
            return Err(Error::ManagedGetFailed {
                kind: R::MANAGED_KIND,
                source: e,
            })
        }
    };
    debug!(
        "Current rv of {} {}: {:?}",
        R::MANAGED_KIND,
        managed_key,
        actual.meta().resource_version
    );

    match R::plan(&expected, &actual)? {
        Plan::Update { object, drift } => {
            info!(?drift, "Update {}: {}", R::MANAGED_KIND, managed_key);
            ctx.managed
                .update(&object)
                .await
                .map_err(|e| Error::ManagedUpdateFailed {
                    kind: R::MANAGED_KIND,
                    source: e,
                })?;
            Ok(Action::requeue(ctx.config.requeue_after()))
        }
        Plan::Converged => {
            if let Some(observed) = R::observe(&owner, &actual) {
                info!("Update status of {} {}", R::OWNER_KIND, key);
                ctx.owners
                    .update_status(&observed)
                    .await
                    .map_err(|e| Error::StatusUpdateFailed {
                        kind: R::OWNER_KIND,
                        source: e,
                    })?;
            }
            Ok(Action::await_change())
        }
    }
}

/// Decides when a failed object is retried: exponential backoff per object.
pub fn error_policy<R: Reconciler>(
    owner: Arc<R::Owner>,
    error: &Error,
    ctx: Arc<Context<R>>,
) -> Action {
    let key = match ObjectKey::from_meta(owner.meta()) {
        Ok(key) => key,
        Err(_) => return Action::requeue(ctx.config.error_backoff(1)),
    };
    let failures = ctx.backoff.record_failure(&key);
    let delay = ctx.config.error_backoff(failures);
    if error.is_build_error() {
        error!(
            controller = R::NAME,
            object = %key,
            failures,
            "Reconcile failed due to error: {}, retry in {:?}",
            error,
            delay
        );
    } else {
        warn!(
            controller = R::NAME,
            object = %key,
            failures,
            "Reconcile failed due to error: {}, retry in {:?}",
            error,
            delay
        );
    }
    Action::requeue(delay)
}
