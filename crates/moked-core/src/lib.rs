pub mod ports;
pub mod event_bus;
pub mod identity;
pub mod followups;
pub mod controller;

#[cfg(test)]
mod tests;
