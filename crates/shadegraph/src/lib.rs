// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph-to-shader compilation engine.
//!
//! This crate translates a directed graph of typed material nodes into
//! textual shader source plus a manifest of required properties:
//! - Typed input/output slots with widening-compatibility validation
//! - Dependency-ordered traversal with cycle detection
//! - Property collection de-duplicated by name
//! - Deterministic chunked code emission with indentation tracking
//! - Master-node assembly through pluggable subshader strategies
//!
//! ## Architecture
//!
//! The [`Graph`] is the single owner of nodes and edges; slots and edges
//! address each other through [`SlotRef`] handles. Mutation takes `&mut
//! Graph` while a generation pass takes `&Graph`, so a pass always observes
//! one consistent snapshot. Structural errors (cycles, missing master) abort
//! a pass; per-node emission errors degrade to best-effort output with
//! recorded diagnostics.

pub mod edge;
pub mod generator;
pub mod graph;
pub mod node;
pub mod nodes;
pub mod properties;
pub mod slot;
pub mod subshader;
pub mod traversal;

pub use edge::{Edge, EdgeId};
pub use generator::{IndentError, ShaderGenerator};
pub use graph::{ConnectError, Graph};
pub use node::{ModificationScope, Node, NodeId, SlotError};
pub use nodes::master::{
    generate_shader, generate_shader_from, Diagnostic, GeneratedShader, GenerateError,
    MasterConfig, RenderingMode, Workflow,
};
pub use nodes::math::MathOp;
pub use nodes::{EmitError, GenerationMode, NodeKind, PropertyReference};
pub use properties::{
    FilterMode, PropertyCollector, PropertyKind, PropertySource, ShaderProperty, TextureInfo,
};
pub use slot::{Slot, SlotDirection, SlotId, SlotRef, SlotValue, SlotValueType, ShaderStage};
pub use subshader::{SubShader, SurfaceMaterialOptions};
pub use traversal::{collect_active_nodes, CycleError};
