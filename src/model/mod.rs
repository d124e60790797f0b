//! Core data types for releases, editions, and report formats.
//!
//! - [`ReleaseTag`] - A release tag parsed into a semantic version
//! - [`Edition`] - The product edition and the images it ships
//! - [`ReportFormat`] - Output formats produced by the scanner
//!
//! # Example
//!
//! ```
//! use relscan::{Edition, ReleaseTag};
//!
//! let tag = ReleaseTag::parse("v1.8.2").unwrap();
//! let images = Edition::OpenSource.images_for(tag.version());
//!
//! assert_eq!(tag.minor_line(), (1, 8));
//! assert!(images.contains(&"gateway"));
//! ```

mod edition;
mod format;
mod release;

pub use edition::*;
pub use format::*;
pub use release::*;
