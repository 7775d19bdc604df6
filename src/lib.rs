//! RoadBook Backend Library
//!
//! Accounts and sessions, badge eligibility and notifications for the
//! RoadBook learner-driver logbook. The binary in main.rs only wires
//! configuration, tracing and the listener around [`api::build_router`].

pub mod api;
pub mod auth;
pub mod badges;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod notifications;
pub mod state;
pub mod store;
