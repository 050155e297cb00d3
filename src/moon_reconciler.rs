// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use k8s_openapi::chrono::Utc;

use crate::common::{deployment_key, ObjectKey};
use crate::derivative::is_derivative_of;
use crate::error::BuildError;
use crate::moon_types::*;
use crate::reconciler::{Drift, Plan, Reconciler};
use crate::resources::make_deployment;

/// Keeps one Deployment per Moon.
///
/// The pod template is compared by derivative equality, so fields the API
/// server fills in do not count as drift. The replica count is compared
/// exactly and only checked once the template matches.
pub struct MoonReconciler;

impl Reconciler for MoonReconciler {
    type Owner = Moon;
    type Managed = Deployment;

    const NAME: &'static str = "moon-controller";
    const OWNER_KIND: &'static str = "Moon";
    const MANAGED_KIND: &'static str = "Deployment";

    fn managed_key(owner_key: &ObjectKey, _moon: &Moon) -> ObjectKey {
        deployment_key(owner_key)
    }

    fn build(moon: &Moon) -> Result<Deployment, BuildError> {
        make_deployment(moon)
    }

    fn plan(expected: &Deployment, actual: &Deployment) -> Result<Plan<Deployment>, BuildError> {
        let expected_spec = match expected.spec.as_ref() {
            Some(spec) => spec,
            None => return Ok(Plan::Converged),
        };
        let template_matches = match actual.spec.as_ref() {
            Some(actual_spec) => is_derivative_of(&expected_spec.template, &actual_spec.template)
                .map_err(|e| BuildError::Encode("pod template", e))?,
            None => false,
        };
        if !template_matches {
            return Ok(Plan::Update {
                object: Deployment {
                    spec: expected.spec.clone(),
                    ..actual.clone()
                },
                drift: Drift::Template,
            });
        }

        let actual_replicas = actual.spec.as_ref().and_then(|spec| spec.replicas);
        if actual_replicas != expected_spec.replicas {
            let mut scaled = actual.clone();
            if let Some(spec) = scaled.spec.as_mut() {
                spec.replicas = expected_spec.replicas;
            }
            return Ok(Plan::Update {
                object: scaled,
                drift: Drift::Replicas,
            });
        }

        Ok(Plan::Converged)
    }

    fn observe(moon: &Moon, _deployment: &Deployment) -> Option<Moon> {
        let found_upstream = moon.spec.upstream();
        if let Some(status) = moon.status.as_ref() {
            if status.found_upstream == found_upstream && status.last_synced.is_some() {
                return None;
            }
        }
        let mut observed = moon.clone();
        observed.status = Some(MoonStatus {
            found_upstream: found_upstream.to_string(),
            last_synced: Some(Time(Utc::now())),
        });
        Some(observed)
    }
}
