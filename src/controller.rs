// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use anyhow::Result;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{
    api::Api,
    runtime::{
        controller::{self, Action, Controller},
        reflector::ObjectRef,
        watcher,
    },
    Client, Resource,
};
use kube_core::NamespaceResourceScope;
use std::sync::Arc;
use tracing::*;

use crate::config::ControllerConfig;
use crate::error::Error;
use crate::moon_reconciler::MoonReconciler;
use crate::moon_types::Moon;
use crate::reconciler::{error_policy, reconcile, Context, Reconciler};
use crate::solar_reconciler::SolarReconciler;
use crate::solar_types::Solar;
use crate::store::{KubeStore, ObjectStore};

/// Short label for the action a successful cycle asked for.
fn outcome(action: &Action) -> &'static str {
    if *action == Action::await_change() {
        "in sync"
    } else {
        "requeued"
    }
}

pub fn log_reconcile_result<K, QueueErr>(
    controller_name: &str,
    result: &Result<(ObjectRef<K>, Action), controller::Error<Error, QueueErr>>,
) where
    K: Resource,
    QueueErr: std::error::Error,
{
    match result {
        Ok((obj, action)) => info!(
            controller.name = controller_name,
            object = %obj,
            outcome = outcome(action),
            ?action,
            "Reconcile finished"
        ),
        // error_policy has already logged the reconciler's own failure.
        Err(err) => debug!(
            controller.name = controller_name,
            error = err as &dyn std::error::Error,
            "Reconcile failed"
        ),
    }
}

fn scoped_api<K>(client: &Client, config: &ControllerConfig) -> Api<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
{
    match config.namespace.as_deref() {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}

fn context<R>(client: &Client, config: &ControllerConfig) -> Arc<Context<R>>
where
    R: Reconciler,
    KubeStore<R::Owner>: ObjectStore<R::Owner>,
    KubeStore<R::Managed>: ObjectStore<R::Managed>,
{
    Arc::new(Context::new(
        Arc::new(KubeStore::<R::Owner>::new(client.clone(), config.store_timeout())),
        Arc::new(KubeStore::<R::Managed>::new(client.clone(), config.store_timeout())),
        config.clone(),
    ))
}

fn controller_config(config: &ControllerConfig) -> controller::Config {
    controller::Config::default().concurrency(config.concurrency)
}

/// Runs the Moon and Solar controllers until a shutdown signal arrives.
///
/// Each controller watches its own kind plus the kind it owns, so an edit or
/// deletion of a Deployment or ConfigMap re-triggers its owner.
pub async fn run(client: Client, config: ControllerConfig) -> Result<()> {
    let moon_controller = Controller::new(
        scoped_api::<Moon>(&client, &config),
        watcher::Config::default(),
    )
    .owns(
        scoped_api::<Deployment>(&client, &config),
        watcher::Config::default(),
    )
    .with_config(controller_config(&config))
    .shutdown_on_signal()
    .run(
        reconcile::<MoonReconciler>,
        error_policy::<MoonReconciler>,
        context::<MoonReconciler>(&client, &config),
    )
    .map(|res| log_reconcile_result(MoonReconciler::NAME, &res));

    let solar_controller = Controller::new(
        scoped_api::<Solar>(&client, &config),
        watcher::Config::default(),
    )
    .owns(
        scoped_api::<ConfigMap>(&client, &config),
        watcher::Config::default(),
    )
    .with_config(controller_config(&config))
    .shutdown_on_signal()
    .run(
        reconcile::<SolarReconciler>,
        error_policy::<SolarReconciler>,
        context::<SolarReconciler>(&client, &config),
    )
    .map(|res| log_reconcile_result(SolarReconciler::NAME, &res));

    info!(
        namespace = config.namespace.as_deref().unwrap_or("<all>"),
        "running moon-controller and solar-controller"
    );
    futures::stream::select(moon_controller, solar_controller)
        .collect::<()>()
        .await;
    info!("controller terminated");
    Ok(())
}
