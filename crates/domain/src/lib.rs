//! Domain models and services for the feedback survey backend.
//!
//! This crate contains:
//! - Request/response models shared between the API and persistence layers
//! - Typed application settings parsed from the key-value settings store
//! - Invitation email content rendering

pub mod models;
pub mod services;
