pub mod theme;
pub mod panels;


pub use panels::chat::{chat_panel, ChatIntent, InputState};
