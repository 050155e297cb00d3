// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_REPLICAS: i32 = 1;

/// A Moon asks for a frontend workload that knows which upstream it orbits.
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(group = "lunar.dev", version = "v1", kind = "Moon")]
#[kube(shortname = "moon", namespaced, status = "MoonStatus")]
#[kube(printcolumn = r#"{"name":"Sun", "type":"string", "jsonPath":".status.foundUpstream"}"#)]
#[kube(printcolumn = r#"{"name":"Desired", "type":"integer", "jsonPath":".spec.replicas"}"#)]
#[kube(printcolumn = r#"{"name":"LastSynced", "type":"date", "jsonPath":".status.lastSynced"}"#)]
#[serde(rename_all = "camelCase")]
pub struct MoonSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 0), default = "default_replicas")]
    pub replicas: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoonStatus {
    #[serde(default)]
    pub found_upstream: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced: Option<Time>,
}

fn default_replicas() -> Option<i32> {
    Some(DEFAULT_REPLICAS)
}

impl MoonSpec {
    pub fn desired_replicas(&self) -> i32 {
        self.replicas.unwrap_or(DEFAULT_REPLICAS)
    }

    pub fn upstream(&self) -> &str {
        self.upstream_name.as_deref().unwrap_or_default()
    }
}
