#![doc = include_str!("../README.md")]

#[cfg(feature = "cli")]
pub mod cli;
pub mod document;
pub mod encode;
pub mod error;
pub mod options;
pub mod sequence;
pub mod session;
pub mod taxa;
pub mod utils;
pub mod validate;

#[doc(inline)]
#[cfg(feature = "cli")]
pub use crate::cli::Cli;
#[doc(inline)]
#[cfg(feature = "cli")]
pub use crate::cli::Verbosity;
#[doc(inline)]
pub use crate::document::Document;
#[doc(inline)]
pub use crate::error::GenerateError;
#[doc(inline)]
pub use crate::sequence::SequenceMatrix;
#[doc(inline)]
pub use crate::session::{GenerateArgs, Session};
#[doc(inline)]
pub use crate::taxa::TaxonSpeciesMap;
