// Presentation layer - HTTP surface
pub mod app_state;
pub mod handlers;
pub mod live_handlers;
