pub mod notifications;
pub mod tripay;
