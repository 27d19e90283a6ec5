pub mod billing;
pub mod credits;
pub mod subscription;
pub mod user;

pub use billing::Billing;
pub use credits::{Balance, Credits, Ledger, NewSubscription};
pub use subscription::Subscriptions;
pub use user::User;
