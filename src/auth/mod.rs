//! Authentication Module
//! Mission: Credentials, access/refresh tokens and role-based access control

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod service;

pub use jwt::{JwtHandler, TokenLifetimes};
pub use middleware::{auth_middleware, authorize_roles, AllowedRoles, ADMIN_ONLY};
pub use service::AuthService;
