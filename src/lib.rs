// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session Token Service - Bearer Access/Refresh Tokens
//!
//! This crate issues and validates HS256 session tokens and keeps refresh
//! registrations and blacklisted tokens in an expiring revocation store.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token issuance, validation, refresh and logout
//! - `config` - Environment configuration
//! - `storage` - Revocation stores (in-memory, redb) and expiry sweeping

pub mod api;
pub mod auth;
pub mod config;
pub mod state;
pub mod storage;
