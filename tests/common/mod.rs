//! Common test utilities for senorge.
//!
//! Synthetic rasters, BIL/NetCDF fixtures and float assertions shared by the
//! integration tests.

#![allow(dead_code)]

pub mod assertions;
pub mod test_data;
