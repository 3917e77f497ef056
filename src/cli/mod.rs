//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `init` | Create `toolspec.toml` with an example tool |
//! | `list` | Show configured tools and their sources |
//! | `generate` | Write `<Tool>.json` for each selected tool |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug logs on stderr; `RUST_LOG`
//! overrides the level:
//! ```bash
//! toolspec --verbose generate --tool Docker
//! ```

mod app;
mod generate;
mod output;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
