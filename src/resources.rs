// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use k8s_openapi::api::apps::v1 as appsv1;
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use kube::api::{ObjectMeta, Resource};
use std::collections::BTreeMap;

use crate::common::*;
use crate::error::BuildError;
use crate::moon_types::*;
use crate::solar_types::*;

fn owner_reference<K>(owner: &K) -> Result<metav1::OwnerReference, BuildError>
where
    K: Resource<DynamicType = ()>,
{
    owner.controller_owner_ref(&()).ok_or_else(|| {
        BuildError::MissingOwnerReference(ObjectKey::new(
            owner.meta().namespace.clone().unwrap_or_default(),
            owner.meta().name.clone().unwrap_or_default(),
        ))
    })
}

fn owner_labels(moon: &Moon) -> BTreeMap<String, String> {
    BTreeMap::from([(OWNER_LABEL.to_string(), moon_name(moon))])
}

pub fn make_deployment(moon: &Moon) -> Result<appsv1::Deployment, BuildError> {
    let replicas = moon.spec.desired_replicas();
    if replicas < 0 {
        return Err(BuildError::NegativeReplicas(replicas));
    }
    Ok(appsv1::Deployment {
        metadata: ObjectMeta {
            name: moon.metadata.name.clone(),
            namespace: moon.metadata.namespace.clone(),
            owner_references: Some(vec![owner_reference(moon)?]),
            ..ObjectMeta::default()
        },
        spec: Some(appsv1::DeploymentSpec {
            replicas: Some(replicas),
            selector: metav1::LabelSelector {
                match_labels: Some(owner_labels(moon)),
                ..metav1::LabelSelector::default()
            },
            template: corev1::PodTemplateSpec {
                metadata: Some(metav1::ObjectMeta {
                    labels: Some(owner_labels(moon)),
                    ..metav1::ObjectMeta::default()
                }),
                spec: Some(make_moon_pod_spec(moon)),
            },
            ..appsv1::DeploymentSpec::default()
        }),
        ..appsv1::Deployment::default()
    })
}

fn make_moon_pod_spec(moon: &Moon) -> corev1::PodSpec {
    corev1::PodSpec {
        containers: vec![corev1::Container {
            name: MOON_CONTAINER_NAME.to_string(),
            image: Some(MOON_IMAGE.to_string()),
            env: Some(vec![corev1::EnvVar {
                name: UPSTREAM_ENV.to_string(),
                value: Some(moon.spec.upstream().to_string()),
                ..corev1::EnvVar::default()
            }]),
            ports: Some(vec![corev1::ContainerPort {
                name: Some(HTTP_PORT_NAME.to_string()),
                protocol: Some("TCP".to_string()),
                container_port: HTTP_PORT,
                ..corev1::ContainerPort::default()
            }]),
            ..corev1::Container::default()
        }],
        ..corev1::PodSpec::default()
    }
}

// TODO: read the properties from the Solar spec once it carries them.
pub fn make_config_map(solar: &Solar) -> Result<corev1::ConfigMap, BuildError> {
    if solar.spec.my_name.is_empty() {
        return Err(BuildError::EmptyName("spec.myName"));
    }
    Ok(corev1::ConfigMap {
        metadata: ObjectMeta {
            name: Some(solar.spec.my_name.clone()),
            namespace: solar.metadata.namespace.clone(),
            owner_references: Some(vec![owner_reference(solar)?]),
            ..ObjectMeta::default()
        },
        data: Some(BTreeMap::from([(
            SOLAR_PROPERTIES_KEY.to_string(),
            SOLAR_PROPERTIES.to_string(),
        )])),
        ..corev1::ConfigMap::default()
    })
}
