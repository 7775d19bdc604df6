pub mod extract;
pub mod routes;

pub use extract::{AppJson, AppQuery};
pub use routes::build_router;
