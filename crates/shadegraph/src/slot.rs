// SPDX-License-Identifier: MIT OR Apache-2.0
//! Slot definitions for node inputs/outputs.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// Identifier for a slot, unique within its owning node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub u32);

/// Non-owning reference to a slot on a node.
///
/// Edges and lookups address slots through this handle rather than through
/// owning references, so the graph stays the single owner of all nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotRef {
    /// Owning node.
    pub node: NodeId,
    /// Slot on that node.
    pub slot: SlotId,
}

impl SlotRef {
    /// Create a slot reference.
    pub fn new(node: NodeId, slot: SlotId) -> Self {
        Self { node, slot }
    }
}

/// Slot direction, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotDirection {
    /// Input slot, accepts at most one incoming edge.
    Input,
    /// Output slot, may fan out to many edges.
    Output,
}

/// Shader stage a slot's value is computed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShaderStage {
    /// Vertex stage.
    Vertex,
    /// Fragment stage.
    Fragment,
}

/// Value type carried by a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotValueType {
    /// Single float.
    Scalar,
    /// 2D vector.
    Vector2,
    /// 3D vector.
    Vector3,
    /// 4D vector.
    Vector4,
    /// Adapts to whatever it is connected to.
    Dynamic,
}

impl SlotValueType {
    /// Widening-compatibility table for connections.
    ///
    /// `Dynamic` accepts and feeds anything; `Scalar` widens to any vector by
    /// broadcast; a fixed-size vector only connects to the same size.
    pub fn can_convert_to(self, other: SlotValueType) -> bool {
        if matches!(self, Self::Dynamic) || matches!(other, Self::Dynamic) {
            return true;
        }
        if self == other {
            return true;
        }
        matches!(
            (self, other),
            (Self::Scalar, Self::Vector2 | Self::Vector3 | Self::Vector4)
        )
    }

    /// Concrete shader type name used in emitted code.
    ///
    /// `Dynamic` resolves to the widest type.
    pub fn shader_type(self) -> &'static str {
        match self {
            Self::Scalar => "float",
            Self::Vector2 => "float2",
            Self::Vector3 => "float3",
            Self::Vector4 | Self::Dynamic => "float4",
        }
    }
}

/// Default value stored on a slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SlotValue {
    /// Single float.
    Scalar(f32),
    /// 2D vector.
    Vector2([f32; 2]),
    /// 3D vector.
    Vector3([f32; 3]),
    /// 4D vector.
    Vector4([f32; 4]),
}

impl SlotValue {
    /// Value type of this value.
    pub fn value_type(&self) -> SlotValueType {
        match self {
            Self::Scalar(_) => SlotValueType::Scalar,
            Self::Vector2(_) => SlotValueType::Vector2,
            Self::Vector3(_) => SlotValueType::Vector3,
            Self::Vector4(_) => SlotValueType::Vector4,
        }
    }

    /// Render this value as a shader literal, e.g. `float3 (0, 0, 1)`.
    pub fn shader_literal(&self) -> String {
        match self {
            Self::Scalar(v) => format_float(*v),
            Self::Vector2([x, y]) => {
                format!("float2 ({}, {})", format_float(*x), format_float(*y))
            }
            Self::Vector3([x, y, z]) => format!(
                "float3 ({}, {}, {})",
                format_float(*x),
                format_float(*y),
                format_float(*z)
            ),
            Self::Vector4([x, y, z, w]) => format!(
                "float4 ({}, {}, {}, {})",
                format_float(*x),
                format_float(*y),
                format_float(*z),
                format_float(*w)
            ),
        }
    }
}

/// Format a float component deterministically.
pub(crate) fn format_float(v: f32) -> String {
    format!("{v}")
}

/// A typed connection point on a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    /// Slot ID, unique within the owning node.
    pub id: SlotId,
    /// Slot name, used for display and emitted variable names.
    pub name: String,
    /// Direction, never changes after creation.
    pub direction: SlotDirection,
    /// Value type.
    pub value_type: SlotValueType,
    /// Default value substituted when an input slot is unconnected.
    pub default_value: SlotValue,
    /// Shader stage.
    pub stage: ShaderStage,
}

impl Slot {
    /// Create an input slot with a zero default.
    pub fn input(id: SlotId, name: impl Into<String>, value_type: SlotValueType) -> Self {
        Self {
            id,
            name: name.into(),
            direction: SlotDirection::Input,
            value_type,
            default_value: zero_value(value_type),
            stage: ShaderStage::Fragment,
        }
    }

    /// Create an output slot.
    pub fn output(id: SlotId, name: impl Into<String>, value_type: SlotValueType) -> Self {
        Self {
            id,
            name: name.into(),
            direction: SlotDirection::Output,
            value_type,
            default_value: zero_value(value_type),
            stage: ShaderStage::Fragment,
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, value: SlotValue) -> Self {
        self.default_value = value;
        self
    }

    /// Set the shader stage.
    pub fn with_stage(mut self, stage: ShaderStage) -> Self {
        self.stage = stage;
        self
    }

    /// Whether an edge from this slot into `other` would type-check.
    ///
    /// Requires this slot to be an output and `other` an input.
    pub fn can_connect_to(&self, other: &Slot) -> bool {
        self.direction == SlotDirection::Output
            && other.direction == SlotDirection::Input
            && self.value_type.can_convert_to(other.value_type)
    }

    /// Emitted variable-name fragment for this slot.
    pub fn variable_suffix(&self) -> String {
        self.name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect()
    }
}

fn zero_value(value_type: SlotValueType) -> SlotValue {
    match value_type {
        SlotValueType::Scalar => SlotValue::Scalar(0.0),
        SlotValueType::Vector2 => SlotValue::Vector2([0.0; 2]),
        SlotValueType::Vector3 => SlotValue::Vector3([0.0; 3]),
        SlotValueType::Vector4 | SlotValueType::Dynamic => SlotValue::Vector4([0.0; 4]),
    }
}
