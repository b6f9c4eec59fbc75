//! Headless match runner for scripted play and CI verification.
//!
//! Runs a level without rendering, driven by JSON commands on stdin with
//! state on stdout. This enables:
//!
//! - **Scripted play**: a controller issues the same commands a player would
//! - **CI verification**: automated checks of game rules and determinism
//! - **Balance runs**: many seeds in parallel with a simple autopilot
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: requests (`tick`, `query`, `command`, `hash`, `quit`)
//! - **stdout**: responses (JSON)
//! - **stderr**: logs (human-readable)
//!
//! See [`protocol`] for the full request/response format.
//!
//! # Example
//!
//! ```bash
//! echo '{"cmd":"tick","count":60}' | cargo run -p td_headless -- run
//! ```

pub mod ascii_visualizer;
pub mod autopilot;
pub mod batch;
pub mod level_loader;
pub mod protocol;
pub mod runner;

pub use ascii_visualizer::{render_ascii, AsciiConfig};
pub use batch::{run_batch, BatchConfig, BatchResults};
pub use level_loader::{load_config, load_level, LevelLoadError};
pub use protocol::{Request, Response};
pub use runner::{HeadlessConfig, HeadlessRunner};
