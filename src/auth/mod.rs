pub mod handlers;
pub mod jwt;
pub mod models;
pub mod password;
pub mod service;
pub mod session;

// Re-export handlers for the route table
pub use handlers::{me, sign_in, sign_out, sign_up};

pub use jwt::{decode_token, TokenSettings};
pub use service::AuthService;
