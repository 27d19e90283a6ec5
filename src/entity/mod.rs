pub mod payment;
pub mod subscription;
pub mod user;

pub use subscription::{Plan, SubscriptionStatus};
