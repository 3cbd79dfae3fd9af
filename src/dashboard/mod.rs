//! Dashboard core: the shared state container, view resolution for the
//! active bot, and the HTTP boundary the rendering frontend consumes.

pub mod server;
pub mod state;
pub mod view;

pub use state::DashboardState;
