//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]**: application state, keyboard and mouse event loop, layer buffers
//! - **[`panes`]**: stateless render functions for the diagram, the details
//!   pane and the status bar
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with a loaded
//! [`HeapHistory`] and call [`App::run`] to start the event loop.
//!
//! [`HeapHistory`]: crate::history::HeapHistory
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
