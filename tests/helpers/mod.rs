//! Shared fixtures and setup for integration tests.

#![allow(dead_code)]

pub mod expand_helpers;
pub mod source_fixtures;
