mod account_name;
mod account_password;
mod carta_id;
mod new_account;
mod statuses;
mod subscriber_email;

pub use account_name::AccountName;
pub use account_password::AccountPassword;
pub use carta_id::CartaId;
pub use new_account::NewAccount;
pub use statuses::{AccountStatus, ReadStatus, SubscriptionStatus};
pub use subscriber_email::SubscriberEmail;
