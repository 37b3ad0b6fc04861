mod auth;
mod cartas;
mod health_check;
mod helpers;
mod storage_status;
mod subscriptions;

pub use auth::*;
pub use cartas::*;
pub use health_check::*;
pub use helpers::{
    ErrorBody, e500, error_chain_fmt, json_error_handler, non_blank, query_error_handler,
};
pub use storage_status::*;
pub use subscriptions::*;
