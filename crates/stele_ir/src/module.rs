//! The module as a whole.

use crate::decl::Decl;
use serde::{Deserialize, Serialize};

/// A module: its name, the modules it imports, and its declarations.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleDecl {
    /// Module name.
    pub name: String,
    /// Imported module names, in source order.
    pub imports: Vec<String>,
    /// Top-level declarations in declaration order.
    pub decls: Vec<Decl>,
}

impl ModuleDecl {
    /// Creates an empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            imports: Vec::new(),
            decls: Vec::new(),
        }
    }

    /// Adds an import.
    pub fn with_import(mut self, module: impl Into<String>) -> Self {
        self.imports.push(module.into());
        self
    }

    /// Adds a declaration.
    pub fn with_decl(mut self, decl: Decl) -> Self {
        self.decls.push(decl);
        self
    }

    /// Finds a declaration by name.
    pub fn find(&self, name: &str) -> Option<&Decl> {
        self.decls.iter().find(|d| d.name == name)
    }

    /// Iterates over declarations that belong in the textual interface.
    pub fn exported_decls(&self) -> impl Iterator<Item = &Decl> {
        self.decls.iter().filter(|d| d.is_exported())
    }

    /// Returns the module with only its exported declarations.
    ///
    /// This is what a module read back from its own interface looks like.
    pub fn exported_surface(&self) -> ModuleDecl {
        let mut imports = self.imports.clone();
        imports.sort();
        imports.dedup();
        ModuleDecl {
            name: self.name.clone(),
            imports,
            decls: self.exported_decls().map(Decl::surface).collect(),
        }
    }
}
