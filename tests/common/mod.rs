//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestLibrary, VIDEO_SOLDER_ID};
//!
//! #[test]
//! fn test_like_video() {
//!     let lib = TestLibrary::on_disk();
//!     let video = lib.video(VIDEO_SOLDER_ID);
//!     lib.library.collections().liked.toggle(video).unwrap();
//! }
//! ```

#[allow(dead_code)]
mod constants;
#[allow(dead_code)]
mod fixtures;

#[allow(unused_imports)]
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{at, demo_catalog, FailingStorage, TestLibrary};
