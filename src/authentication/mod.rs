mod middleware;
mod password;

pub use middleware::{UserId, reject_anonymous_users};
pub use password::{compute_password_hash, hash_password, validate_password, verify_password_hash};
