//! Badges Module
//! Mission: Badge catalogue, awards and automatic eligibility checks

pub mod api;
pub mod catalog;
pub mod criteria;
pub mod models;
pub mod service;

pub use criteria::CriteriaTag;
pub use service::BadgeService;
