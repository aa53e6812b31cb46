//! Root of the `richinput-core` library.

// Prevent accidental direct writes to stdout/stderr in library code. All
// user-visible output must go through the host (e.g., the TUI) or the
// tracing stack.
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod caret;
pub mod composer;
pub mod config;
pub mod directory;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod mention;
pub mod snapshot;
pub mod span;
pub mod util;

pub use composer::Composer;
pub use composer::KeyOutcome;
pub use composer::MentionKey;
pub use config::Config;
pub use config::ConfigOverrides;
pub use directory::CaseMatching;
pub use directory::Directory;
pub use directory::StaticDirectory;
pub use geometry::CaretCoords;
pub use geometry::CaretGeometry;
pub use geometry::MonospaceGeometry;
pub use snapshot::Snapshot;
pub use span::Span;
pub use span::SpanKind;
pub use span::classify;
