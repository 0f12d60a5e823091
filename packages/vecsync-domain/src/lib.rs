pub mod aggregate;
pub mod extract;
pub mod record;
pub mod status;

mod error;

pub use error::{Error, Result};
