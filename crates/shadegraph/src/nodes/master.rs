// SPDX-License-Identifier: MIT OR Apache-2.0
//! Master node: graph root configuration and final shader assembly.

use crate::generator::{IndentError, ShaderGenerator};
use crate::graph::Graph;
use crate::node::{ModificationScope, Node, NodeId};
use crate::nodes::{EmitError, GenerationMode, NodeKind};
use crate::properties::{PropertyCollector, TextureInfo};
use crate::slot::{Slot, SlotId, SlotValue, SlotValueType};
use crate::subshader::{select_subshader, SurfaceMaterialOptions};
use crate::traversal::{collect_active_nodes, CycleError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Albedo input.
pub const ALBEDO_SLOT: SlotId = SlotId(0);
/// Normal input.
pub const NORMAL_SLOT: SlotId = SlotId(1);
/// Metallic input (Metallic workflow only).
pub const METALLIC_SLOT: SlotId = SlotId(2);
/// Specular input (Specular workflow only).
pub const SPECULAR_SLOT: SlotId = SlotId(3);
/// Emission input.
pub const EMISSION_SLOT: SlotId = SlotId(4);
/// Smoothness input.
pub const SMOOTHNESS_SLOT: SlotId = SlotId(5);
/// Occlusion input.
pub const OCCLUSION_SLOT: SlotId = SlotId(6);
/// Alpha input.
pub const ALPHA_SLOT: SlotId = SlotId(7);
/// Alpha clip threshold input.
pub const ALPHA_THRESHOLD_SLOT: SlotId = SlotId(8);

/// PBR workflow selecting which reflectance slot exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Workflow {
    /// Specular-color workflow.
    Specular,
    /// Metallic workflow.
    Metallic,
}

/// Rendering mode selecting blend/cull/depth state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderingMode {
    /// Fully opaque.
    Opaque,
    /// Alpha-tested.
    Cutout,
    /// Premultiplied transparency.
    Transparent,
    /// Traditional alpha blending.
    Fade,
    /// Additive blending.
    Additive,
    /// Multiplicative blending.
    Multiply,
    /// User-managed render state.
    Custom,
}

impl RenderingMode {
    /// The preset-backed modes, i.e. everything except `Custom`.
    pub const PRESETS: [RenderingMode; 6] = [
        Self::Opaque,
        Self::Cutout,
        Self::Transparent,
        Self::Fade,
        Self::Additive,
        Self::Multiply,
    ];
}

/// Configuration of a master node.
///
/// Changing the workflow reshapes the slot set (topological); changing the
/// rendering mode or surface options only affects emitted render state
/// (graph-level). Use the setters on [`Graph`] so edges on pruned slots are
/// dropped and dirty marks recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterConfig {
    /// Selected workflow.
    pub workflow: Workflow,
    /// Selected rendering mode.
    pub rendering: RenderingMode,
    /// One options record per preset rendering mode.
    mode_options: IndexMap<RenderingMode, SurfaceMaterialOptions>,
    /// Dedicated record used while `rendering` is `Custom`.
    custom_options: SurfaceMaterialOptions,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            workflow: Workflow::Metallic,
            rendering: RenderingMode::Opaque,
            mode_options: RenderingMode::PRESETS
                .iter()
                .map(|m| (*m, SurfaceMaterialOptions::preset(*m)))
                .collect(),
            custom_options: SurfaceMaterialOptions::preset(RenderingMode::Opaque),
        }
    }
}

impl MasterConfig {
    /// Options record for the current rendering mode.
    pub fn surface_material_options(&self) -> SurfaceMaterialOptions {
        if self.rendering == RenderingMode::Custom {
            self.custom_options
        } else {
            self.mode_options
                .get(&self.rendering)
                .copied()
                .unwrap_or_else(|| SurfaceMaterialOptions::preset(self.rendering))
        }
    }

    /// Replace the options record for the current rendering mode.
    pub fn set_surface_material_options(&mut self, options: SurfaceMaterialOptions) {
        if self.rendering == RenderingMode::Custom {
            self.custom_options = options;
        } else {
            self.mode_options.insert(self.rendering, options);
        }
    }

    pub(crate) fn required_slots(&self) -> Vec<Slot> {
        let grey = SlotValue::Vector3([0.5, 0.5, 0.5]);
        let mut slots = vec![
            Slot::input(ALBEDO_SLOT, "Albedo", SlotValueType::Vector3).with_default(grey),
            Slot::input(NORMAL_SLOT, "Normal", SlotValueType::Vector3)
                .with_default(SlotValue::Vector3([0.0, 0.0, 1.0])),
            Slot::input(EMISSION_SLOT, "Emission", SlotValueType::Vector3),
        ];
        match self.workflow {
            Workflow::Metallic => {
                slots.push(Slot::input(METALLIC_SLOT, "Metallic", SlotValueType::Scalar));
            }
            Workflow::Specular => {
                slots.push(
                    Slot::input(SPECULAR_SLOT, "Specular", SlotValueType::Vector3)
                        .with_default(grey),
                );
            }
        }
        slots.push(
            Slot::input(SMOOTHNESS_SLOT, "Smoothness", SlotValueType::Scalar)
                .with_default(SlotValue::Scalar(0.5)),
        );
        slots.push(
            Slot::input(OCCLUSION_SLOT, "Occlusion", SlotValueType::Scalar)
                .with_default(SlotValue::Scalar(1.0)),
        );
        slots.push(
            Slot::input(ALPHA_SLOT, "Alpha", SlotValueType::Scalar)
                .with_default(SlotValue::Scalar(1.0)),
        );
        slots.push(Slot::input(
            ALPHA_THRESHOLD_SLOT,
            "AlphaClipThreshold",
            SlotValueType::Scalar,
        ));
        slots
    }

    /// Emit the surface-description assignments for the subshader body.
    pub(crate) fn generate_code(
        &self,
        node: &Node,
        inputs: &[String],
        visitor: &mut ShaderGenerator,
    ) -> Result<(), EmitError> {
        visitor.add_shader_chunk("SurfaceDescription surface = (SurfaceDescription)0;", true);
        for (slot, expression) in node.input_slots().zip(inputs) {
            visitor.add_shader_chunk(format!("surface.{} = {};", slot.name, expression), true);
        }
        Ok(())
    }
}

impl Graph {
    /// Switch a master node's workflow.
    ///
    /// Rebuilds the slot set synchronously, drops edges attached to pruned
    /// slots, and records a topological dirty mark. Returns `false` when the
    /// node is not a master or the workflow is unchanged.
    pub fn set_master_workflow(&mut self, master: NodeId, workflow: Workflow) -> bool {
        let Some(node) = self.node_mut(master) else {
            return false;
        };
        let NodeKind::Master(config) = &mut node.kind else {
            return false;
        };
        if config.workflow == workflow {
            return false;
        }
        config.workflow = workflow;
        let removed = node.rebuild_slots();
        node.mark_dirty(ModificationScope::Topological);
        self.drop_edges_on_slots(master, &removed);
        true
    }

    /// Switch a master node's rendering mode. Slot structure is unaffected,
    /// so only a graph-level dirty mark is recorded.
    pub fn set_master_rendering(&mut self, master: NodeId, rendering: RenderingMode) -> bool {
        let Some(node) = self.node_mut(master) else {
            return false;
        };
        let NodeKind::Master(config) = &mut node.kind else {
            return false;
        };
        if config.rendering == rendering {
            return false;
        }
        config.rendering = rendering;
        node.mark_dirty(ModificationScope::Graph);
        true
    }

    /// Replace the surface options record of the current rendering mode.
    pub fn set_master_surface_options(
        &mut self,
        master: NodeId,
        options: SurfaceMaterialOptions,
    ) -> bool {
        let Some(node) = self.node_mut(master) else {
            return false;
        };
        let NodeKind::Master(config) = &mut node.kind else {
            return false;
        };
        config.set_surface_material_options(options);
        node.mark_dirty(ModificationScope::Graph);
        true
    }
}

/// A recorded per-node emission failure. Generation continued without the
/// node's contribution.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// The node whose emission was skipped.
    pub node: NodeId,
    /// Human-readable reason.
    pub message: String,
}

/// Fatal error aborting a generation pass.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// No master node exists to generate from.
    #[error("no master node in graph")]
    MissingMasterNode,

    /// The active graph contains a cycle; no output was produced.
    #[error(transparent)]
    Cycle(#[from] CycleError),

    /// Emitter misuse bug.
    #[error(transparent)]
    Indent(#[from] IndentError),
}

/// Result of a successful generation pass.
#[derive(Debug)]
pub struct GeneratedShader {
    /// Full shader source text.
    pub source: String,
    /// Required texture bindings.
    pub textures: Vec<TextureInfo>,
    /// Per-node emission failures tolerated during the pass.
    pub diagnostics: Vec<Diagnostic>,
}

/// Generate the shader from the graph's master node.
pub fn generate_shader(
    graph: &Graph,
    output_name: &str,
    mode: GenerationMode,
) -> Result<GeneratedShader, GenerateError> {
    let master = graph
        .nodes()
        .find(|n| matches!(n.kind, NodeKind::Master(_)))
        .map(|n| n.id)
        .ok_or(GenerateError::MissingMasterNode)?;
    generate_shader_from(graph, master, output_name, mode)
}

/// Generate the shader rooted at a specific master node.
pub fn generate_shader_from(
    graph: &Graph,
    master: NodeId,
    output_name: &str,
    mode: GenerationMode,
) -> Result<GeneratedShader, GenerateError> {
    let Some(master_node) = graph.node(master) else {
        return Err(GenerateError::MissingMasterNode);
    };
    let NodeKind::Master(config) = &master_node.kind else {
        return Err(GenerateError::MissingMasterNode);
    };

    // Structural errors surface before any text is assembled.
    let active = collect_active_nodes(graph, master)?;
    let labels: HashMap<NodeId, String> = active
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, format!("node{i}")))
        .collect();

    let mut properties = PropertyCollector::new();
    for property in graph.properties() {
        properties.add_property(property.clone());
    }
    for id in &active {
        if let (Some(node), Some(label)) = (graph.node(*id), labels.get(id)) {
            node.kind.collect_properties(node, label, &mut properties, mode);
        }
    }

    let mut diagnostics = Vec::new();
    let subshader = select_subshader(config);

    let mut shader = ShaderGenerator::new();
    shader.add_shader_chunk(format!("Shader \"{output_name}\""), true);
    shader.add_shader_chunk("{", true);
    shader.indent();

    shader.add_shader_chunk("Properties", true);
    shader.add_shader_chunk("{", true);
    shader.indent();
    let block = properties.properties_block(0);
    if !block.is_empty() {
        shader.add_shader_chunk(block, true);
    }
    shader.deindent()?;
    shader.add_shader_chunk("}", true);

    let fragment = subshader.generate(graph, master, &active, &labels, mode, &mut diagnostics)?;
    shader.add_shader_chunk(fragment, true);

    shader.deindent()?;
    shader.add_shader_chunk("}", true);

    Ok(GeneratedShader {
        source: shader.shader_string(0),
        textures: properties.configured_textures(),
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::math::MathOp;
    use crate::nodes::OUTPUT_SLOT;
    use crate::properties::{FilterMode, PropertyKind, ShaderProperty};
    use crate::slot::SlotRef;
    use crate::subshader::CullMode;

    fn master_graph() -> (Graph, NodeId) {
        let mut graph = Graph::new("test");
        let master = graph.add_node(Node::new("PBR Master", NodeKind::Master(MasterConfig::default())));
        (graph, master)
    }

    fn constant(graph: &mut Graph, value: SlotValue) -> NodeId {
        graph.add_node(Node::new("Constant", NodeKind::Constant(value)))
    }

    #[test]
    fn test_default_master_has_metallic_slot() {
        let (graph, master) = master_graph();
        let node = graph.node(master).unwrap();
        assert!(node.slot(METALLIC_SLOT).is_some());
        assert!(node.slot(SPECULAR_SLOT).is_none());
        assert_eq!(node.input_slots().count(), 8);
    }

    #[test]
    fn test_workflow_switch_swaps_slots_and_drops_edges() {
        let (mut graph, master) = master_graph();
        let metal = constant(&mut graph, SlotValue::Scalar(1.0));
        let albedo = constant(&mut graph, SlotValue::Vector3([1.0, 0.0, 0.0]));
        graph
            .connect(
                SlotRef::new(metal, OUTPUT_SLOT),
                SlotRef::new(master, METALLIC_SLOT),
            )
            .unwrap();
        graph
            .connect(
                SlotRef::new(albedo, OUTPUT_SLOT),
                SlotRef::new(master, ALBEDO_SLOT),
            )
            .unwrap();

        assert!(graph.set_master_workflow(master, Workflow::Specular));

        let node = graph.node(master).unwrap();
        assert!(node.slot(METALLIC_SLOT).is_none());
        assert!(node.slot(SPECULAR_SLOT).is_some());

        // The Metallic edge is gone; the Albedo edge is untouched.
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.edge_to(SlotRef::new(master, ALBEDO_SLOT)).is_some());

        assert_eq!(
            graph.node_mut(master).unwrap().take_dirty(),
            Some(ModificationScope::Topological)
        );

        // Setting the same workflow again is a no-op.
        assert!(!graph.set_master_workflow(master, Workflow::Specular));
    }

    #[test]
    fn test_rendering_switch_is_graph_level() {
        let (mut graph, master) = master_graph();
        let slots_before: Vec<SlotId> =
            graph.node(master).unwrap().slots().map(|s| s.id).collect();

        assert!(graph.set_master_rendering(master, RenderingMode::Transparent));

        let node = graph.node_mut(master).unwrap();
        let slots_after: Vec<SlotId> = node.slots().map(|s| s.id).collect();
        assert_eq!(slots_before, slots_after);
        assert_eq!(node.take_dirty(), Some(ModificationScope::Graph));
    }

    #[test]
    fn test_custom_options_record_is_isolated() {
        let (mut graph, master) = master_graph();

        graph.set_master_rendering(master, RenderingMode::Custom);
        let mut custom = SurfaceMaterialOptions::preset(RenderingMode::Opaque);
        custom.cull = CullMode::Off;
        graph.set_master_surface_options(master, custom);

        // Back to Opaque: the preset record is untouched.
        graph.set_master_rendering(master, RenderingMode::Opaque);
        let config = match &graph.node(master).unwrap().kind {
            NodeKind::Master(c) => c.clone(),
            _ => unreachable!(),
        };
        assert_eq!(config.surface_material_options().cull, CullMode::Back);

        // Custom still remembers its dedicated record.
        graph.set_master_rendering(master, RenderingMode::Custom);
        let config = match &graph.node(master).unwrap().kind {
            NodeKind::Master(c) => c.clone(),
            _ => unreachable!(),
        };
        assert_eq!(config.surface_material_options().cull, CullMode::Off);
    }

    #[test]
    fn test_generate_without_master_fails() {
        let mut graph = Graph::new("test");
        constant(&mut graph, SlotValue::Scalar(1.0));
        let result = generate_shader(&graph, "Test", GenerationMode::Final);
        assert!(matches!(result, Err(GenerateError::MissingMasterNode)));
    }

    #[test]
    fn test_generate_full_shader() {
        let (mut graph, master) = master_graph();
        let albedo = constant(&mut graph, SlotValue::Vector3([1.0, 0.0, 0.0]));
        let metal = constant(&mut graph, SlotValue::Scalar(0.25));
        graph
            .connect(
                SlotRef::new(albedo, OUTPUT_SLOT),
                SlotRef::new(master, ALBEDO_SLOT),
            )
            .unwrap();
        graph
            .connect(
                SlotRef::new(metal, OUTPUT_SLOT),
                SlotRef::new(master, METALLIC_SLOT),
            )
            .unwrap();

        let generated = generate_shader(&graph, "Test/Material", GenerationMode::Final).unwrap();
        assert!(generated.diagnostics.is_empty());
        assert!(generated.textures.is_empty());

        let source = &generated.source;
        assert!(source.starts_with("Shader \"Test/Material\""));
        assert!(source.contains("Properties"));
        assert!(source.contains("SubShader"));
        assert!(source.contains("node0_value = float3 (1, 0, 0);"));
        assert!(source.contains("surface.Albedo = node0_value;"));
        assert!(source.contains("surface.Metallic = node1_value;"));
        // Unconnected slots fall back to their default literals.
        assert!(source.contains("surface.Normal = float3 (0, 0, 1);"));
        assert!(source.contains("surface.Smoothness = 0.5;"));
        // Dependencies are emitted before their consumers.
        assert!(
            source.find("node0_value =").unwrap() < source.find("surface.Albedo").unwrap()
        );

        // Determinism: a second pass renders byte-identical output.
        let again = generate_shader(&graph, "Test/Material", GenerationMode::Final).unwrap();
        assert_eq!(generated.source, again.source);
    }

    #[test]
    fn test_generate_cycle_fails_with_no_output() {
        let (mut graph, master) = master_graph();
        let a = graph.add_node(Node::new("Negate", NodeKind::Math(MathOp::Negate)));
        let b = graph.add_node(Node::new("Saturate", NodeKind::Math(MathOp::Saturate)));
        graph
            .connect(
                SlotRef::new(a, OUTPUT_SLOT),
                SlotRef::new(b, crate::nodes::math::INPUT_A_SLOT),
            )
            .unwrap();
        graph
            .connect(
                SlotRef::new(b, OUTPUT_SLOT),
                SlotRef::new(a, crate::nodes::math::INPUT_A_SLOT),
            )
            .unwrap();
        graph
            .connect(SlotRef::new(b, OUTPUT_SLOT), SlotRef::new(master, ALBEDO_SLOT))
            .unwrap();

        let result = generate_shader(&graph, "Test", GenerationMode::Final);
        assert!(matches!(result, Err(GenerateError::Cycle(_))));
    }

    #[test]
    fn test_invalid_slot_configuration_is_skipped_not_fatal() {
        let (mut graph, master) = master_graph();
        let add = graph.add_node(Node::new("Add", NodeKind::Math(MathOp::Add)));
        graph
            .connect(SlotRef::new(add, OUTPUT_SLOT), SlotRef::new(master, ALBEDO_SLOT))
            .unwrap();

        // Strip the math node's inputs so its emission cannot resolve them.
        graph.remove_slots_not_matching(add, &[OUTPUT_SLOT], false);

        let generated = generate_shader(&graph, "Test", GenerationMode::Final).unwrap();
        assert_eq!(generated.diagnostics.len(), 1);
        assert_eq!(generated.diagnostics[0].node, add);
        // Best-effort output still contains the rest of the shader.
        assert!(generated.source.contains("surface.Albedo"));
        assert!(!generated.source.contains("node0_result ="));
    }

    #[test]
    fn test_preview_mode_promotes_constants() {
        let (mut graph, master) = master_graph();
        let albedo = constant(&mut graph, SlotValue::Vector3([1.0, 0.0, 0.0]));
        graph
            .connect(
                SlotRef::new(albedo, OUTPUT_SLOT),
                SlotRef::new(master, ALBEDO_SLOT),
            )
            .unwrap();

        let preview = generate_shader(&graph, "Test", GenerationMode::Preview).unwrap();
        assert!(preview
            .source
            .contains("_node0_value(\"Constant\", Vector) = (1, 0, 0, 0)"));
        assert!(preview
            .source
            .contains("float3 node0_value = _node0_value.xyz;"));

        // An explicit graph-global property with the same name wins over the
        // synthesized one.
        graph.add_property(ShaderProperty::explicit(
            "_node0_value",
            "Tint",
            PropertyKind::Vector4([0.0; 4]),
        ));
        let preview = generate_shader(&graph, "Test", GenerationMode::Preview).unwrap();
        assert!(preview.source.contains("_node0_value(\"Tint\", Vector)"));
        assert!(!preview.source.contains("(\"Constant\", Vector)"));
    }

    #[test]
    fn test_texture_manifest_reported() {
        let (mut graph, master) = master_graph();
        let sample = graph.add_node(Node::new(
            "Albedo Map",
            NodeKind::TextureSample {
                texture: "_MainTex".to_string(),
                filter: FilterMode::Bilinear,
            },
        ));
        let sat = graph.add_node(Node::new("Saturate", NodeKind::Math(MathOp::Saturate)));
        graph
            .connect(
                SlotRef::new(sample, OUTPUT_SLOT),
                SlotRef::new(sat, crate::nodes::math::INPUT_A_SLOT),
            )
            .unwrap();
        graph
            .connect(SlotRef::new(sat, OUTPUT_SLOT), SlotRef::new(master, ALBEDO_SLOT))
            .unwrap();

        let generated = generate_shader(&graph, "Test", GenerationMode::Final).unwrap();
        assert_eq!(generated.textures.len(), 1);
        assert_eq!(generated.textures[0].name, "_MainTex");
        assert_eq!(generated.textures[0].bind_index, 0);
        assert_eq!(generated.textures[0].filter, FilterMode::Bilinear);
        assert!(generated
            .source
            .contains("_MainTex(\"MainTex\", 2D) = \"white\" {}"));
        // The sample's UV input is unconnected and falls back to its default.
        assert!(generated.source.contains("tex2D(_MainTex, float2 (0, 0))"));
    }
}
