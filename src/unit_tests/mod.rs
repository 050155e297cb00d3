// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
pub mod fake_store;

use k8s_openapi::api::apps::v1::Deployment;
use std::sync::Arc;

use crate::config::ControllerConfig;
use crate::moon_types::{Moon, MoonSpec};
use crate::reconciler::{Context, Reconciler};
use crate::solar_types::{Solar, SolarSpec};
use fake_store::FakeStore;

pub fn moon(name: &str, namespace: &str, replicas: i32, upstream: &str) -> Moon {
    let mut moon = Moon::new(
        name,
        MoonSpec {
            replicas: Some(replicas),
            upstream_name: Some(upstream.to_string()),
        },
    );
    moon.metadata.namespace = Some(namespace.to_string());
    moon.metadata.uid = Some(format!("uid-{}", name));
    moon
}

pub fn solar(name: &str, namespace: &str, my_name: &str) -> Solar {
    let mut solar = Solar::new(
        name,
        SolarSpec {
            my_name: my_name.to_string(),
        },
    );
    solar.metadata.namespace = Some(namespace.to_string());
    solar.metadata.uid = Some(format!("uid-{}", name));
    solar
}

/// Adds the fields an API server defaults on a freshly created Deployment.
pub fn with_server_defaults(deploy: &Deployment) -> Deployment {
    let mut served = deploy.clone();
    if let Some(spec) = served.spec.as_mut() {
        spec.revision_history_limit = Some(10);
        spec.progress_deadline_seconds = Some(600);
        if let Some(pod) = spec.template.spec.as_mut() {
            pod.restart_policy = Some("Always".to_string());
            pod.dns_policy = Some("ClusterFirst".to_string());
            pod.termination_grace_period_seconds = Some(30);
            for container in pod.containers.iter_mut() {
                container.image_pull_policy = Some("IfNotPresent".to_string());
                container.termination_message_path = Some("/dev/termination-log".to_string());
            }
        }
    }
    served
}

pub struct Harness<R: Reconciler> {
    pub owners: Arc<FakeStore<R::Owner>>,
    pub managed: Arc<FakeStore<R::Managed>>,
    pub ctx: Context<R>,
}

impl<R: Reconciler> Harness<R> {
    pub fn new() -> Self {
        let owners = Arc::new(FakeStore::<R::Owner>::new());
        let managed = Arc::new(FakeStore::<R::Managed>::new());
        let ctx = Context::new(owners.clone(), managed.clone(), ControllerConfig::default());
        Harness {
            owners,
            managed,
            ctx,
        }
    }
}
