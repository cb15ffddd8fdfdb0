// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod advisor;
pub mod api;
pub mod auth;
pub mod config;
pub mod engine;
pub mod errors;
pub mod network;
pub mod server;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod users;
