//! Renderer identifiers shared by the tool selection agent and the engines.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of rendering tools the selection agent may name.
///
/// Adding an engine means adding a variant here and an arm in
/// [`RenderEngines::engine`](super::RenderEngines::engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Structured markup compiled to raster (circuits, logic gates, block diagrams).
    DrawSchematic,
    /// Generated plotting/graph code executed in the sandbox.
    PlotWithCode,
    /// External generative image model.
    GenerateImage,
}

impl ToolName {
    pub const ALL: [ToolName; 3] = [
        ToolName::DrawSchematic,
        ToolName::PlotWithCode,
        ToolName::GenerateImage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::DrawSchematic => "draw_schematic",
            ToolName::PlotWithCode => "plot_with_code",
            ToolName::GenerateImage => "generate_image",
        }
    }

    pub fn is_generative(&self) -> bool {
        matches!(self, ToolName::GenerateImage)
    }

    pub fn is_code_based(&self) -> bool {
        !self.is_generative()
    }

    /// One-line description offered to the tool-calling model.
    pub fn description(&self) -> &'static str {
        match self {
            ToolName::DrawSchematic => {
                "Compile a precise schematic from structured markup. Best for circuits, logic gates, block and state diagrams with standard symbols."
            }
            ToolName::PlotWithCode => {
                "Write and run plotting/graph code. Best for function plots, measured curves, trees, graphs and anything needing exact coordinates."
            }
            ToolName::GenerateImage => {
                "Describe the figure to an image generation model. Best for physical setups, apparatus, mechanisms and sketches without exact geometry."
            }
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown tool: {}", s))
    }
}
