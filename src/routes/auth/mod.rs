mod current_user;
mod errors;
mod login;
mod logout;
mod register;

pub use current_user::*;
pub use errors::AuthError;
pub use login::*;
pub use logout::*;
pub use register::*;
