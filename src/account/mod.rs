pub mod handlers;
pub mod models;
pub mod service;

pub use handlers::{get_account, list_accounts};
pub use service::AccountService;
