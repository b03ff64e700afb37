//! vimdoc Core - Document model, readers, and help file conversion
//!
//! This crate contains the core logic for vimdoc, independent of the command line:
//! - Document tree shared by the Markdown and HTML readers
//! - Conversion of that tree to Vim's help file format
//! - Anchor, table of contents and reference bookkeeping
//! - Configuration management
//! - Function documentation extracted from Vim scripts

pub mod anchor;
pub mod config;
pub mod convert;
pub mod error;
pub mod front_matter;
pub mod markdown;
pub mod node;
pub mod refs;
pub mod source;
pub mod table;
pub mod toc;
pub mod vimscript;
pub mod wrap;

#[cfg(feature = "html")]
pub mod html;

// Re-export commonly used types
pub use config::Config;
pub use convert::DocConverter;
pub use error::ParseError;
pub use node::{DocumentNode, Heading, List};
pub use source::{InputFormat, SourceDocument};
pub use vimscript::ExtractError;
