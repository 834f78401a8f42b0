pub mod web;
pub mod unavailable;

pub use web::BrowserStorage;
pub use unavailable::UnavailableStorage;
