mod hmac;
mod identity;

pub use hmac::{HmacMiddlewareFactory, HmacMiddlewareService};
pub use identity::{IdentityMiddlewareFactory, IdentityMiddlewareService};
