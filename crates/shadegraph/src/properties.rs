// SPDX-License-Identifier: MIT OR Apache-2.0
//! Collection of shader-visible properties gathered during traversal.

use crate::generator::INDENT_UNIT;
use crate::slot::format_float;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Texture filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    /// Nearest-neighbor.
    Point,
    /// Bilinear.
    Bilinear,
    /// Trilinear.
    Trilinear,
}

/// Value category of a shader property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PropertyKind {
    /// Single float uniform.
    Float(f32),
    /// RGBA color uniform.
    Color([f32; 4]),
    /// Four-component vector uniform.
    Vector4([f32; 4]),
    /// 2D texture binding.
    Texture {
        /// Filtering mode for the sampler.
        filter: FilterMode,
    },
}

/// How a property entered the collector.
///
/// Explicit declarations take precedence over entries synthesized from
/// default values; among equals the existing entry is kept, so collection
/// order is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PropertySource {
    /// Promoted from a default value (e.g. a preview-mode constant).
    SynthesizedDefault,
    /// Declared by a property node or the graph itself.
    Explicit,
}

/// A named shader-visible property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderProperty {
    /// Uniform name, e.g. `_Color`.
    pub name: String,
    /// Display name shown in the host material inspector.
    pub display_name: String,
    /// Value category and default.
    pub kind: PropertyKind,
    /// Declaration precedence.
    pub source: PropertySource,
}

impl ShaderProperty {
    /// Create an explicit property.
    pub fn explicit(
        name: impl Into<String>,
        display_name: impl Into<String>,
        kind: PropertyKind,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            kind,
            source: PropertySource::Explicit,
        }
    }

    /// Create a synthesized-default property.
    pub fn synthesized(
        name: impl Into<String>,
        display_name: impl Into<String>,
        kind: PropertyKind,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            kind,
            source: PropertySource::SynthesizedDefault,
        }
    }

    /// Render the declaration line for the properties block.
    pub fn declaration_line(&self) -> String {
        match &self.kind {
            PropertyKind::Float(v) => format!(
                "{}(\"{}\", Float) = {}",
                self.name,
                self.display_name,
                format_float(*v)
            ),
            PropertyKind::Color(c) => format!(
                "{}(\"{}\", Color) = ({}, {}, {}, {})",
                self.name,
                self.display_name,
                format_float(c[0]),
                format_float(c[1]),
                format_float(c[2]),
                format_float(c[3])
            ),
            PropertyKind::Vector4(v) => format!(
                "{}(\"{}\", Vector) = ({}, {}, {}, {})",
                self.name,
                self.display_name,
                format_float(v[0]),
                format_float(v[1]),
                format_float(v[2]),
                format_float(v[3])
            ),
            PropertyKind::Texture { .. } => format!(
                "{}(\"{}\", 2D) = \"white\" {{}}",
                self.name, self.display_name
            ),
        }
    }
}

/// Required texture binding reported alongside the generated source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureInfo {
    /// Uniform name.
    pub name: String,
    /// Bind slot, assigned in declaration order.
    pub bind_index: u32,
    /// Filtering mode.
    pub filter: FilterMode,
}

/// Accumulates properties encountered during traversal, de-duplicated by name.
#[derive(Debug, Default)]
pub struct PropertyCollector {
    properties: IndexMap<String, ShaderProperty>,
}

impl PropertyCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property.
    ///
    /// A property with a name already present replaces the existing entry
    /// only when it is more specific (explicit over synthesized-default);
    /// the replacement keeps the original declaration position.
    pub fn add_property(&mut self, property: ShaderProperty) {
        match self.properties.get_mut(&property.name) {
            Some(existing) => {
                if property.source > existing.source {
                    *existing = property;
                }
            }
            None => {
                self.properties.insert(property.name.clone(), property);
            }
        }
    }

    /// Collected properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = &ShaderProperty> {
        self.properties.values()
    }

    /// Number of collected properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the collector is empty.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Render one declaration line per property, each indented to
    /// `indent_depth`, in declaration order.
    pub fn properties_block(&self, indent_depth: usize) -> String {
        let mut lines = Vec::with_capacity(self.properties.len());
        for property in self.properties.values() {
            let mut line = INDENT_UNIT.repeat(indent_depth);
            line.push_str(&property.declaration_line());
            lines.push(line);
        }
        lines.join("\n")
    }

    /// Every texture property with its bind slot, in declaration order.
    pub fn configured_textures(&self) -> Vec<TextureInfo> {
        self.properties
            .values()
            .filter_map(|p| match p.kind {
                PropertyKind::Texture { filter } => Some((p.name.clone(), filter)),
                _ => None,
            })
            .enumerate()
            .map(|(i, (name, filter))| TextureInfo {
                name,
                bind_index: i as u32,
                filter,
            })
            .collect()
    }
}
