pub mod handlers;
pub mod models;
pub mod service;

pub use handlers::{get_payment, list_payments, submit_edition};
pub use service::PaymentService;
