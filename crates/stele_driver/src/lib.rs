//! Wiring between configuration, the interface pipeline and the cache.
//!
//! [`InterfacePipeline`] is the compilation pipeline run for a cache miss: it
//! parses an interface body and encodes the result as a binary module.
//! [`BinaryModuleReader`] turns artifacts back into modules, and a
//! [`Session`] assembles both into a loader from a [`ResolvedConfig`].
//!
//! [`ResolvedConfig`]: stele_config::ResolvedConfig

#![warn(missing_docs)]

pub mod error;
pub mod pipeline;
pub mod reader;
pub mod session;

pub use error::DriverError;
pub use pipeline::InterfacePipeline;
pub use reader::{emit_interface_from_binary, BinaryModuleReader};
pub use session::{open_config, InterfaceInput, Session, SessionLoader};
