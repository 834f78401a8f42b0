pub mod fetch;

pub use fetch::FetchTransport;
