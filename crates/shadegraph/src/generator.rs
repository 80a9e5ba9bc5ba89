// SPDX-License-Identifier: MIT OR Apache-2.0
//! Text emitter with indentation-scope tracking.

/// Indent unit applied per depth level.
pub const INDENT_UNIT: &str = "    ";

/// Error from unbalanced indentation calls.
///
/// This indicates an emission-logic bug, never user input; it is surfaced as
/// a fatal generation error rather than silently mis-rendering.
#[derive(Debug, thiserror::Error)]
pub enum IndentError {
    /// `deindent` was called at depth zero.
    #[error("deindent below zero: unbalanced indent/deindent calls")]
    Unbalanced,
}

/// One appended chunk of shader text.
#[derive(Debug, Clone)]
struct ShaderChunk {
    text: String,
    own_line: bool,
    /// Indent depth recorded at append time.
    depth: usize,
}

/// Accumulates ordered text chunks and renders the final shader source.
///
/// Identical chunk sequences always render to byte-identical output.
#[derive(Debug, Default)]
pub struct ShaderGenerator {
    chunks: Vec<ShaderChunk>,
    depth: usize,
}

impl ShaderGenerator {
    /// Create an empty generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk, recording the current indent depth.
    ///
    /// With `own_line` the chunk starts a new indented line (every line of a
    /// multi-line chunk is indented); otherwise the text is appended inline
    /// to the previous chunk's line.
    pub fn add_shader_chunk(&mut self, text: impl Into<String>, own_line: bool) {
        self.chunks.push(ShaderChunk {
            text: text.into(),
            own_line,
            depth: self.depth,
        });
    }

    /// Increase the indent depth.
    pub fn indent(&mut self) {
        self.depth += 1;
    }

    /// Decrease the indent depth.
    pub fn deindent(&mut self) -> Result<(), IndentError> {
        if self.depth == 0 {
            return Err(IndentError::Unbalanced);
        }
        self.depth -= 1;
        Ok(())
    }

    /// Current indent depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Render all chunks, indenting each own-line chunk by
    /// `base_indent + recorded depth` units.
    pub fn shader_string(&self, base_indent: usize) -> String {
        let mut out = String::new();
        for (i, chunk) in self.chunks.iter().enumerate() {
            if chunk.own_line || i == 0 {
                for line in chunk.text.lines() {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    for _ in 0..(base_indent + chunk.depth) {
                        out.push_str(INDENT_UNIT);
                    }
                    out.push_str(line);
                }
            } else {
                out.push_str(&chunk.text);
            }
        }
        out
    }
}
