//! Reading binary modules, and rendering them back to text.

use std::path::Path;

use stele_binary::{BinaryError, SerializedModule};
use stele_cache::BinaryModuleLoader;
use stele_interface::{emit_to_string, TextualInterfaceOptions};

use crate::error::DriverError;

/// Loads binary modules by decoding them from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryModuleReader;

impl BinaryModuleLoader for BinaryModuleReader {
    type Module = SerializedModule;
    type Error = BinaryError;

    fn load_module(&self, path: &Path) -> Result<SerializedModule, BinaryError> {
        stele_binary::read_module(path)
    }
}

/// Renders the binary module at `path` as a textual interface.
///
/// The header records the module's own flags and tool version.
pub fn emit_interface_from_binary(path: &Path) -> Result<String, DriverError> {
    let module = stele_binary::read_module(path)?;
    let options = TextualInterfaceOptions::new(module.flags);
    Ok(emit_to_string(&module.module, &options, &module.tool_version)?)
}
