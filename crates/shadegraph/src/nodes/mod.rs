// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node kinds and their code emission.
//!
//! Kinds are a tagged variant rather than an inheritance tree: each variant
//! declares its required slot set and knows how to append its own statements
//! to the [`ShaderGenerator`] given already-resolved input expressions.

pub mod master;
pub mod math;

use crate::generator::ShaderGenerator;
use crate::node::Node;
use crate::properties::{FilterMode, PropertyCollector, PropertyKind, ShaderProperty};
use crate::slot::{Slot, SlotId, SlotValue, SlotValueType};
use serde::{Deserialize, Serialize};

use master::MasterConfig;
use math::MathOp;

/// What the generated code is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationMode {
    /// Editor preview: constants are promoted to synthesized properties so a
    /// value edit does not force recompilation.
    Preview,
    /// Final output.
    Final,
}

impl GenerationMode {
    /// Whether this is preview generation.
    pub fn is_preview(self) -> bool {
        matches!(self, Self::Preview)
    }
}

/// Non-fatal failure emitting one node's code.
///
/// The node's contribution is skipped and recorded as a diagnostic;
/// generation continues.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// A slot the kind requires was absent at emission time.
    #[error("invalid slot configuration: missing slot {0:?}")]
    MissingSlot(SlotId),

    /// A texture property was used where a value expression is required.
    #[error("texture property '{0}' cannot be referenced as a value; sample it instead")]
    TextureReference(String),
}

/// Output slot ID shared by the single-output kinds.
pub const OUTPUT_SLOT: SlotId = SlotId(100);
/// UV input slot of a texture-sample node.
pub const UV_SLOT: SlotId = SlotId(0);

/// Emitted variable name for a node's output slot.
pub fn output_variable_name(label: &str, slot: &Slot) -> String {
    format!("{label}_{}", slot.variable_suffix())
}

/// A graph-global uniform referenced by a property node.
///
/// Texture properties are consumed through [`NodeKind::TextureSample`], not
/// referenced as values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyReference {
    /// Uniform name, e.g. `_Tint`.
    pub name: String,
    /// Display name for the host inspector.
    pub display_name: String,
    /// Value category and default.
    pub kind: PropertyKind,
}

/// Kind-specific configuration and behavior of a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeKind {
    /// Fixed value.
    Constant(SlotValue),
    /// Math function over dynamic inputs.
    Math(MathOp),
    /// Reference to a shader-visible uniform.
    Property(PropertyReference),
    /// 2D texture sample.
    TextureSample {
        /// Texture property name, e.g. `_MainTex`.
        texture: String,
        /// Filtering mode reported in the texture manifest.
        filter: FilterMode,
    },
    /// Graph root; triggers full traversal and final assembly.
    Master(MasterConfig),
}

impl NodeKind {
    /// The slot set this kind requires, in declaration order.
    pub fn required_slots(&self) -> Vec<Slot> {
        match self {
            Self::Constant(value) => vec![Slot::output(OUTPUT_SLOT, "Value", value.value_type())
                .with_default(*value)],
            Self::Math(op) => op.required_slots(),
            Self::Property(reference) => {
                let value_type = match reference.kind {
                    PropertyKind::Float(_) => SlotValueType::Scalar,
                    _ => SlotValueType::Vector4,
                };
                vec![Slot::output(OUTPUT_SLOT, "Value", value_type)]
            }
            Self::TextureSample { .. } => vec![
                Slot::input(UV_SLOT, "UV", SlotValueType::Vector2),
                Slot::output(OUTPUT_SLOT, "Color", SlotValueType::Vector4),
            ],
            Self::Master(config) => config.required_slots(),
        }
    }

    /// Declare this node's shader-visible properties.
    pub fn collect_properties(
        &self,
        node: &Node,
        label: &str,
        collector: &mut PropertyCollector,
        mode: GenerationMode,
    ) {
        match self {
            Self::Constant(value) => {
                if mode.is_preview() {
                    collector.add_property(ShaderProperty::synthesized(
                        format!("_{label}_value"),
                        &node.name,
                        constant_property_kind(*value),
                    ));
                }
            }
            Self::Property(reference) => {
                collector.add_property(ShaderProperty::explicit(
                    &reference.name,
                    &reference.display_name,
                    reference.kind,
                ));
            }
            Self::TextureSample { texture, filter } => {
                collector.add_property(ShaderProperty::explicit(
                    texture,
                    texture.trim_start_matches('_'),
                    PropertyKind::Texture { filter: *filter },
                ));
            }
            Self::Math(_) | Self::Master(_) => {}
        }
    }

    /// Append this node's statements to the emitter.
    ///
    /// `inputs` holds one resolved expression per input slot, in declaration
    /// order: the upstream output variable when connected, the slot's default
    /// literal otherwise.
    pub fn generate_code(
        &self,
        node: &Node,
        label: &str,
        inputs: &[String],
        visitor: &mut ShaderGenerator,
        mode: GenerationMode,
    ) -> Result<(), EmitError> {
        match self {
            Self::Constant(value) => {
                let slot = find_slot(node, OUTPUT_SLOT)?;
                let var = output_variable_name(label, slot);
                let expression = if mode.is_preview() {
                    // Promoted uniform; swizzle back down to the slot width.
                    format!("_{var}{}", narrowing_swizzle(value.value_type()))
                } else {
                    value.shader_literal()
                };
                visitor.add_shader_chunk(
                    format!("{} {var} = {expression};", value.value_type().shader_type()),
                    true,
                );
                Ok(())
            }
            Self::Math(op) => op.generate_code(node, label, inputs, visitor),
            Self::Property(reference) => {
                if let PropertyKind::Texture { .. } = reference.kind {
                    return Err(EmitError::TextureReference(reference.name.clone()));
                }
                let slot = find_slot(node, OUTPUT_SLOT)?;
                let var = output_variable_name(label, slot);
                visitor.add_shader_chunk(
                    format!(
                        "{} {var} = {};",
                        slot.value_type.shader_type(),
                        reference.name
                    ),
                    true,
                );
                Ok(())
            }
            Self::TextureSample { texture, .. } => {
                let slot = find_slot(node, OUTPUT_SLOT)?;
                let uv = inputs.first().ok_or(EmitError::MissingSlot(UV_SLOT))?;
                let var = output_variable_name(label, slot);
                visitor.add_shader_chunk(format!("float4 {var} = tex2D({texture}, {uv});"), true);
                Ok(())
            }
            Self::Master(config) => config.generate_code(node, inputs, visitor),
        }
    }
}

fn find_slot(node: &Node, id: SlotId) -> Result<&Slot, EmitError> {
    node.slot(id).ok_or(EmitError::MissingSlot(id))
}

fn constant_property_kind(value: SlotValue) -> PropertyKind {
    match value {
        SlotValue::Scalar(v) => PropertyKind::Float(v),
        SlotValue::Vector2([x, y]) => PropertyKind::Vector4([x, y, 0.0, 0.0]),
        SlotValue::Vector3([x, y, z]) => PropertyKind::Vector4([x, y, z, 0.0]),
        SlotValue::Vector4(v) => PropertyKind::Vector4(v),
    }
}

fn narrowing_swizzle(value_type: SlotValueType) -> &'static str {
    match value_type {
        SlotValueType::Scalar => "",
        SlotValueType::Vector2 => ".xy",
        SlotValueType::Vector3 => ".xyz",
        SlotValueType::Vector4 | SlotValueType::Dynamic => "",
    }
}
