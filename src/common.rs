// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use kube::api::ObjectMeta;
use std::fmt;

use crate::error::Error;
use crate::moon_types::Moon;
use crate::solar_types::Solar;

pub const OWNER_LABEL: &str = "deployment/owner";
pub const MOON_CONTAINER_NAME: &str = "moon-container";
pub const MOON_IMAGE: &str = "gcr.io/google-samples/gb-frontend:v4";
pub const UPSTREAM_ENV: &str = "UPSTREAM";
pub const HTTP_PORT_NAME: &str = "http";
pub const HTTP_PORT: i32 = 80;
pub const SOLAR_PROPERTIES_KEY: &str = "solar.properties";
pub const SOLAR_PROPERTIES: &str = "spectral.class=G2V\nsurface.temperature=5772K\n";

/// Namespace and name of a namespaced object; the unit of reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        ObjectKey {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn from_meta(meta: &ObjectMeta) -> Result<Self, Error> {
        let name = meta
            .name
            .as_ref()
            .ok_or_else(|| Error::MissingObjectKey(".metadata.name"))?;
        let namespace = meta
            .namespace
            .as_ref()
            .ok_or_else(|| Error::MissingObjectKey(".metadata.namespace"))?;
        Ok(ObjectKey::new(namespace.clone(), name.clone()))
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

pub fn deployment_key(moon_key: &ObjectKey) -> ObjectKey {
    moon_key.clone()
}

pub fn config_map_key(solar_key: &ObjectKey, solar: &Solar) -> ObjectKey {
    ObjectKey::new(solar_key.namespace.clone(), solar.spec.my_name.clone())
}

pub fn moon_name(moon: &Moon) -> String {
    moon.metadata.name.clone().unwrap_or_default()
}
