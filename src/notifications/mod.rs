//! Notifications Module
//! Mission: Per-user notification inbox

pub mod api;
pub mod models;
pub mod service;

pub use service::NotificationService;
