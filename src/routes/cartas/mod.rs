mod errors;
mod get;
mod list;
mod read_receipt;

pub use errors::CartaError;
pub use get::*;
pub use list::*;
pub use read_receipt::*;
