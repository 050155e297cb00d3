// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(group = "lunar.dev", version = "v1", kind = "Solar")]
#[kube(shortname = "solar", namespaced, status = "SolarStatus")]
#[serde(rename_all = "camelCase")]
pub struct SolarSpec {
    /// Name given to the ConfigMap this Solar publishes.
    pub my_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SolarStatus {
    #[serde(default)]
    pub dependent_name: String,
}
