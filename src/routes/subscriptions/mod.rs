mod dashboard;
mod errors;
mod helpers;
mod status;
mod subscribe;

pub use dashboard::*;
pub use errors::SubscribeError;
pub use helpers::{SubscriptionOutcome, ensure_subscription};
pub use status::*;
pub use subscribe::*;
