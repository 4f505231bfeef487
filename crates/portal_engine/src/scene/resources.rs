//! Opaque handles to collaborator-owned resources
//!
//! Models, shaders and textures are loaded and owned by the asset and shader
//! subsystems. The core only ever stores the handles they hand out and never
//! manages their lifetime.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Handle to a model owned by the model subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelHandle(pub u32);

/// Handle to a compiled shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShaderHandle(pub u32);

/// Handle to a texture bind slot (skyboxes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureHandle(pub u32);

/// Name-to-handle registry
///
/// Handles are assigned densely in registration order, so the handle value
/// equals the registration index. Registering an existing name returns the
/// handle it already has.
#[derive(Debug, Clone)]
pub struct ResourceRegistry<H> {
    names: Vec<String>,
    lookup: HashMap<String, H>,
}

impl<H: Copy + From<u32>> ResourceRegistry<H> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// Register a resource name and return its handle
    pub fn register(&mut self, name: impl Into<String>) -> H {
        let name = name.into();
        if let Some(handle) = self.lookup.get(&name) {
            return *handle;
        }
        // Registries hold a handful of entries; u32 cannot overflow in practice
        let handle = H::from(u32::try_from(self.names.len()).unwrap_or(u32::MAX));
        self.lookup.insert(name.clone(), handle);
        self.names.push(name);
        handle
    }

    /// Look up a previously registered name
    pub fn get(&self, name: &str) -> Option<H> {
        self.lookup.get(name).copied()
    }

    /// Registered names in handle order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of registered resources
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<H: Copy + From<u32>> Default for ResourceRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u32> for ModelHandle {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<u32> for ShaderHandle {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<u32> for TextureHandle {
    fn from(value: u32) -> Self {
        Self(value)
    }
}
