pub mod actions;
mod app;
pub mod events;
pub mod mouse;

pub use app::App;
pub use mouse::MouseCapture;
