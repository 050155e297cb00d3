// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use k8s_openapi::api::core::v1::ConfigMap;

use crate::common::{config_map_key, ObjectKey};
use crate::derivative::is_derivative_of;
use crate::error::BuildError;
use crate::reconciler::{Drift, Plan, Reconciler};
use crate::resources::make_config_map;
use crate::solar_types::*;

/// Keeps the ConfigMap named by `spec.myName` in the Solar's namespace.
pub struct SolarReconciler;

impl Reconciler for SolarReconciler {
    type Owner = Solar;
    type Managed = ConfigMap;

    const NAME: &'static str = "solar-controller";
    const OWNER_KIND: &'static str = "Solar";
    const MANAGED_KIND: &'static str = "ConfigMap";

    fn managed_key(owner_key: &ObjectKey, solar: &Solar) -> ObjectKey {
        config_map_key(owner_key, solar)
    }

    fn build(solar: &Solar) -> Result<ConfigMap, BuildError> {
        make_config_map(solar)
    }

    fn plan(expected: &ConfigMap, actual: &ConfigMap) -> Result<Plan<ConfigMap>, BuildError> {
        let data_matches = is_derivative_of(&expected.data, &actual.data)
            .map_err(|e| BuildError::Encode("config map data", e))?;
        if data_matches {
            return Ok(Plan::Converged);
        }
        Ok(Plan::Update {
            object: ConfigMap {
                data: expected.data.clone(),
                ..actual.clone()
            },
            drift: Drift::Data,
        })
    }

    fn observe(solar: &Solar, config_map: &ConfigMap) -> Option<Solar> {
        let dependent_name = config_map.metadata.name.clone().unwrap_or_default();
        let current = solar.status.as_ref().map(|s| s.dependent_name.as_str());
        if current == Some(dependent_name.as_str()) {
            return None;
        }
        let mut observed = solar.clone();
        observed.status = Some(SolarStatus { dependent_name });
        Some(observed)
    }
}
