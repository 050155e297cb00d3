// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
pub mod common;
pub mod config;
pub mod controller;
pub mod derivative;
pub mod error;
pub mod moon_reconciler;
pub mod moon_types;
pub mod reconciler;
pub mod resources;
pub mod solar_reconciler;
pub mod solar_types;
pub mod store;
pub mod telemetry;

#[cfg(test)]
pub mod unit_tests;

pub use error::{BuildError, Error, StoreError};
