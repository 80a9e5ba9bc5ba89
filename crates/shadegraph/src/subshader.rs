// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pluggable subshader code-emission strategies and render-state options.

use crate::generator::ShaderGenerator;
use crate::graph::Graph;
use crate::node::{Node, NodeId};
use crate::nodes::master::{Diagnostic, GenerateError, MasterConfig, RenderingMode, Workflow};
use crate::nodes::{output_variable_name, GenerationMode, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Blend factor token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendFactor {
    /// `One`
    One,
    /// `Zero`
    Zero,
    /// `SrcAlpha`
    SrcAlpha,
    /// `DstColor`
    DstColor,
    /// `OneMinusSrcAlpha`
    OneMinusSrcAlpha,
}

impl BlendFactor {
    fn token(self) -> &'static str {
        match self {
            Self::One => "One",
            Self::Zero => "Zero",
            Self::SrcAlpha => "SrcAlpha",
            Self::DstColor => "DstColor",
            Self::OneMinusSrcAlpha => "OneMinusSrcAlpha",
        }
    }
}

/// Face culling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CullMode {
    /// Cull back faces.
    Back,
    /// Cull front faces.
    Front,
    /// No culling.
    Off,
}

impl CullMode {
    fn token(self) -> &'static str {
        match self {
            Self::Back => "Back",
            Self::Front => "Front",
            Self::Off => "Off",
        }
    }
}

/// Depth-write switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZWrite {
    /// Write depth.
    On,
    /// Do not write depth.
    Off,
}

/// Depth-test comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZTest {
    /// Less-or-equal.
    LEqual,
    /// Always pass.
    Always,
}

/// Render queue tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderQueue {
    /// Opaque geometry.
    Geometry,
    /// Alpha-tested geometry.
    AlphaTest,
    /// Blended geometry.
    Transparent,
}

impl RenderQueue {
    fn token(self) -> &'static str {
        match self {
            Self::Geometry => "Geometry",
            Self::AlphaTest => "AlphaTest",
            Self::Transparent => "Transparent",
        }
    }
}

/// Render type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderType {
    /// Opaque surface.
    Opaque,
    /// Alpha-tested surface.
    TransparentCutout,
    /// Blended surface.
    Transparent,
}

impl RenderType {
    fn token(self) -> &'static str {
        match self {
            Self::Opaque => "Opaque",
            Self::TransparentCutout => "TransparentCutout",
            Self::Transparent => "Transparent",
        }
    }
}

/// Blend/cull/depth state emitted into a subshader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceMaterialOptions {
    /// Source blend factor.
    pub src_blend: BlendFactor,
    /// Destination blend factor.
    pub dst_blend: BlendFactor,
    /// Face culling.
    pub cull: CullMode,
    /// Depth write.
    pub z_write: ZWrite,
    /// Depth test.
    pub z_test: ZTest,
    /// Queue tag.
    pub render_queue: RenderQueue,
    /// Render type tag.
    pub render_type: RenderType,
}

impl SurfaceMaterialOptions {
    /// The options record matching a rendering mode. `Custom` starts from the
    /// opaque preset; its record is owned by the master node afterwards.
    pub fn preset(rendering: RenderingMode) -> Self {
        match rendering {
            RenderingMode::Opaque | RenderingMode::Custom => Self {
                src_blend: BlendFactor::One,
                dst_blend: BlendFactor::Zero,
                cull: CullMode::Back,
                z_write: ZWrite::On,
                z_test: ZTest::LEqual,
                render_queue: RenderQueue::Geometry,
                render_type: RenderType::Opaque,
            },
            RenderingMode::Cutout => Self {
                src_blend: BlendFactor::One,
                dst_blend: BlendFactor::Zero,
                cull: CullMode::Back,
                z_write: ZWrite::On,
                z_test: ZTest::LEqual,
                render_queue: RenderQueue::AlphaTest,
                render_type: RenderType::TransparentCutout,
            },
            RenderingMode::Transparent => Self {
                src_blend: BlendFactor::One,
                dst_blend: BlendFactor::OneMinusSrcAlpha,
                cull: CullMode::Back,
                z_write: ZWrite::Off,
                z_test: ZTest::LEqual,
                render_queue: RenderQueue::Transparent,
                render_type: RenderType::Transparent,
            },
            RenderingMode::Fade => Self {
                src_blend: BlendFactor::SrcAlpha,
                dst_blend: BlendFactor::OneMinusSrcAlpha,
                cull: CullMode::Back,
                z_write: ZWrite::Off,
                z_test: ZTest::LEqual,
                render_queue: RenderQueue::Transparent,
                render_type: RenderType::Transparent,
            },
            RenderingMode::Additive => Self {
                src_blend: BlendFactor::One,
                dst_blend: BlendFactor::One,
                cull: CullMode::Back,
                z_write: ZWrite::Off,
                z_test: ZTest::LEqual,
                render_queue: RenderQueue::Transparent,
                render_type: RenderType::Transparent,
            },
            RenderingMode::Multiply => Self {
                src_blend: BlendFactor::DstColor,
                dst_blend: BlendFactor::Zero,
                cull: CullMode::Back,
                z_write: ZWrite::Off,
                z_test: ZTest::LEqual,
                render_queue: RenderQueue::Transparent,
                render_type: RenderType::Transparent,
            },
        }
    }

    fn emit_render_state(&self, visitor: &mut ShaderGenerator) {
        visitor.add_shader_chunk(
            format!(
                "Tags {{ \"RenderType\" = \"{}\" \"Queue\" = \"{}\" }}",
                self.render_type.token(),
                self.render_queue.token()
            ),
            true,
        );
        visitor.add_shader_chunk(
            format!("Blend {} {}", self.src_blend.token(), self.dst_blend.token()),
            true,
        );
        visitor.add_shader_chunk(format!("Cull {}", self.cull.token()), true);
        visitor.add_shader_chunk(
            format!("ZWrite {}", if self.z_write == ZWrite::On { "On" } else { "Off" }),
            true,
        );
        visitor.add_shader_chunk(
            format!(
                "ZTest {}",
                match self.z_test {
                    ZTest::LEqual => "LEqual",
                    ZTest::Always => "Always",
                }
            ),
            true,
        );
    }
}

/// A pluggable subshader generator.
///
/// Given the active node set of one traversal, a strategy renders one
/// complete `SubShader { ... }` fragment. Strategies hold no mutable state,
/// so two master nodes can generate independently.
pub trait SubShader {
    /// Render the subshader fragment.
    fn generate(
        &self,
        graph: &Graph,
        master: NodeId,
        active: &[NodeId],
        labels: &HashMap<NodeId, String>,
        mode: GenerationMode,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<String, GenerateError>;
}

/// Select the strategy for a master configuration.
pub fn select_subshader(config: &MasterConfig) -> Box<dyn SubShader> {
    Box::new(ForwardPbrSubShader {
        workflow: config.workflow,
    })
}

/// Forward-rendered PBR subshader covering both workflows.
pub struct ForwardPbrSubShader {
    workflow: Workflow,
}

impl SubShader for ForwardPbrSubShader {
    fn generate(
        &self,
        graph: &Graph,
        master: NodeId,
        active: &[NodeId],
        labels: &HashMap<NodeId, String>,
        mode: GenerationMode,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<String, GenerateError> {
        let Some(master_node) = graph.node(master) else {
            return Err(GenerateError::MissingMasterNode);
        };
        let NodeKind::Master(config) = &master_node.kind else {
            return Err(GenerateError::MissingMasterNode);
        };

        let mut body = ShaderGenerator::new();
        body.add_shader_chunk("SubShader", true);
        body.add_shader_chunk("{", true);
        body.indent();
        config.surface_material_options().emit_render_state(&mut body);

        body.add_shader_chunk("Pass", true);
        body.add_shader_chunk("{", true);
        body.indent();
        body.add_shader_chunk(
            format!(
                "Name \"FORWARD_{}\"",
                match self.workflow {
                    Workflow::Metallic => "METALLIC",
                    Workflow::Specular => "SPECULAR",
                }
            ),
            true,
        );

        for id in active {
            let Some(node) = graph.node(*id) else {
                continue;
            };
            let Some(label) = labels.get(id) else {
                continue;
            };
            let inputs = resolve_inputs(graph, node, labels);
            if let Err(error) = node.kind.generate_code(node, label, &inputs, &mut body, mode) {
                tracing::warn!("skipping node '{}': {}", node.name, error);
                diagnostics.push(Diagnostic {
                    node: node.id,
                    message: error.to_string(),
                });
            }
        }

        body.deindent()?;
        body.add_shader_chunk("}", true);
        body.deindent()?;
        body.add_shader_chunk("}", true);
        Ok(body.shader_string(0))
    }
}

/// Resolve one expression per input slot, in declaration order: the upstream
/// output variable when connected, the slot's default literal otherwise.
fn resolve_inputs(graph: &Graph, node: &Node, labels: &HashMap<NodeId, String>) -> Vec<String> {
    node.input_slots()
        .map(|slot| {
            let connected = graph.edge_to(node.slot_ref(slot.id)).and_then(|edge| {
                let upstream = graph.node(edge.from.node)?;
                let from_slot = upstream.slot(edge.from.slot)?;
                let label = labels.get(&edge.from.node)?;
                Some(output_variable_name(label, from_slot))
            });
            connected.unwrap_or_else(|| slot.default_value.shader_literal())
        })
        .collect()
}
