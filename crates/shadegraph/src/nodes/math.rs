// SPDX-License-Identifier: MIT OR Apache-2.0
//! Math-function node kind.

use crate::generator::ShaderGenerator;
use crate::node::Node;
use crate::nodes::{output_variable_name, EmitError, OUTPUT_SLOT};
use crate::slot::{Slot, SlotId, SlotValueType};
use serde::{Deserialize, Serialize};

/// First input of a math node.
pub const INPUT_A_SLOT: SlotId = SlotId(0);
/// Second input of a binary math node.
pub const INPUT_B_SLOT: SlotId = SlotId(1);

/// Math function applied by a [`NodeKind::Math`](crate::nodes::NodeKind) node.
///
/// Inputs and outputs are `Dynamic` so the same node works on scalars and
/// vectors; `Dot` collapses to a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MathOp {
    /// `a + b`
    Add,
    /// `a - b`
    Subtract,
    /// `a * b`
    Multiply,
    /// `a / b`
    Divide,
    /// `min(a, b)`
    Minimum,
    /// `max(a, b)`
    Maximum,
    /// `pow(a, b)`
    Power,
    /// `dot(a, b)`
    Dot,
    /// `sin(x)`
    Sin,
    /// `cos(x)`
    Cos,
    /// `abs(x)`
    Abs,
    /// `-x`
    Negate,
    /// `saturate(x)`
    Saturate,
    /// `1 - x`
    OneMinus,
    /// `normalize(x)`
    Normalize,
    /// `frac(x)`
    Fract,
    /// `floor(x)`
    Floor,
}

impl MathOp {
    /// Number of inputs this function takes.
    pub fn arity(self) -> usize {
        match self {
            Self::Add
            | Self::Subtract
            | Self::Multiply
            | Self::Divide
            | Self::Minimum
            | Self::Maximum
            | Self::Power
            | Self::Dot => 2,
            _ => 1,
        }
    }

    /// Display name used for node construction.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Subtract => "Subtract",
            Self::Multiply => "Multiply",
            Self::Divide => "Divide",
            Self::Minimum => "Minimum",
            Self::Maximum => "Maximum",
            Self::Power => "Power",
            Self::Dot => "Dot Product",
            Self::Sin => "Sine",
            Self::Cos => "Cosine",
            Self::Abs => "Absolute",
            Self::Negate => "Negate",
            Self::Saturate => "Saturate",
            Self::OneMinus => "One Minus",
            Self::Normalize => "Normalize",
            Self::Fract => "Fraction",
            Self::Floor => "Floor",
        }
    }

    /// Value type of the result slot.
    pub fn output_value_type(self) -> SlotValueType {
        match self {
            Self::Dot => SlotValueType::Scalar,
            _ => SlotValueType::Dynamic,
        }
    }

    pub(crate) fn required_slots(self) -> Vec<Slot> {
        let mut slots = vec![Slot::input(INPUT_A_SLOT, "A", SlotValueType::Dynamic)];
        if self.arity() == 2 {
            slots.push(Slot::input(INPUT_B_SLOT, "B", SlotValueType::Dynamic));
        }
        slots.push(Slot::output(OUTPUT_SLOT, "Result", self.output_value_type()));
        slots
    }

    fn call_body(self, inputs: &[String]) -> String {
        let a = &inputs[0];
        match self {
            Self::Add => format!("{a} + {}", inputs[1]),
            Self::Subtract => format!("{a} - {}", inputs[1]),
            Self::Multiply => format!("{a} * {}", inputs[1]),
            Self::Divide => format!("{a} / {}", inputs[1]),
            Self::Minimum => format!("min({a}, {})", inputs[1]),
            Self::Maximum => format!("max({a}, {})", inputs[1]),
            Self::Power => format!("pow({a}, {})", inputs[1]),
            Self::Dot => format!("dot({a}, {})", inputs[1]),
            Self::Sin => format!("sin({a})"),
            Self::Cos => format!("cos({a})"),
            Self::Abs => format!("abs({a})"),
            Self::Negate => format!("-{a}"),
            Self::Saturate => format!("saturate({a})"),
            Self::OneMinus => format!("1 - {a}"),
            Self::Normalize => format!("normalize({a})"),
            Self::Fract => format!("frac({a})"),
            Self::Floor => format!("floor({a})"),
        }
    }

    pub(crate) fn generate_code(
        self,
        node: &Node,
        label: &str,
        inputs: &[String],
        visitor: &mut ShaderGenerator,
    ) -> Result<(), EmitError> {
        let out = node.slot(OUTPUT_SLOT).ok_or(EmitError::MissingSlot(OUTPUT_SLOT))?;
        if inputs.len() < self.arity() {
            return Err(EmitError::MissingSlot(if inputs.is_empty() {
                INPUT_A_SLOT
            } else {
                INPUT_B_SLOT
            }));
        }
        let var = output_variable_name(label, out);
        visitor.add_shader_chunk(
            format!(
                "{} {var} = {};",
                self.output_value_type().shader_type(),
                self.call_body(inputs)
            ),
            true,
        );
        Ok(())
    }
}
