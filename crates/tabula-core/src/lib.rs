pub mod driver;
pub use driver::Connection;

mod error;
pub use error::Error;

pub mod formula;

pub mod schema;

pub mod value;
pub use value::{Type, Value};

/// A Result type alias that uses Tabula's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

pub use async_trait::async_trait;
