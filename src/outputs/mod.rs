//! Output generation: the two [`UiSink`] implementations and the JSON
//! snapshot writer.
//!
//! # Submodules
//!
//! - [`html`]: the page served by `serve`
//! - [`markdown`]: the report written by `render`
//! - [`json`]: the machine-readable snapshot written by `render`
//!
//! # Output Structure (`render`)
//!
//! ```text
//! markdown_output_dir/
//! └── advent_calendar_2024-12-24.md
//!
//! json_output_dir/
//! └── 2024-12-24/
//!     └── 093000.json
//! ```
//!
//! [`UiSink`]: crate::presenter::UiSink

pub mod html;
pub mod json;
pub mod markdown;
