pub mod message;
pub mod protocol;
pub mod identity;
pub mod config;
pub mod error;


pub use error::WidgetError;
pub type Result<T> = std::result::Result<T, WidgetError>;
