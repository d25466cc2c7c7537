mod auth;

pub use auth::AuthenticatedAccount;
