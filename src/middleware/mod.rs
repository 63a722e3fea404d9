// Middleware: token authentication stub and CORS

pub mod auth;
pub mod cors;

pub use auth::{create_token, get_user, verify_token, Claims};
pub use cors::apply_cors;
