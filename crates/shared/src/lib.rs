//! Shared utilities and common types for the feedback survey backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic utilities (API key hashing and generation)
//! - Password hashing with Argon2id
//! - JWT token issuance and validation

pub mod crypto;
pub mod jwt;
pub mod password;
