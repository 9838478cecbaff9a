//! Ratatui front-end. It is a consumer of the session: every change goes
//! through `Session::handle` and every frame is drawn from the latest render
//! snapshot.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
