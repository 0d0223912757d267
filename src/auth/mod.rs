pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;

pub use middleware::require_access_token;
pub use routes::auth_routes;
