#![allow(dead_code)]

pub mod mock;

#[cfg(feature = "integration_test")]
pub mod real;
