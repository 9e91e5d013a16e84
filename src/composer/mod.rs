//! Prompt composer (subject registry).
//!
//! Pure, deterministic lookups from `(Domain, DiagramType)` to the instruction
//! fragments each downstream stage needs. Every lookup is total: specific
//! entry, then domain default, then a domain-neutral fragment.
//!
//! # Example
//!
//! ```
//! use plotwise::composer;
//! use plotwise::taxonomy::{DiagramType, Domain};
//!
//! let hint = composer::reviewer_style_hint(Domain::Mechanical, DiagramType::FreeBodyDiagram);
//! assert!(hint.contains("force arrows"));
//!
//! // Unregistered pairs still get guidance.
//! let generic = composer::agent_guidance(Domain::Unknown, DiagramType::Generic);
//! assert!(!generic.is_empty());
//! ```

mod entries;

use crate::question::{EnginePreference, QuestionHints};
use crate::render::ToolName;
use crate::taxonomy::{is_valid_pair, Classification, DiagramType, Domain};

/// Upper bound on fragment length, in words.
pub const MAX_FRAGMENT_WORDS: usize = 150;

const NEUTRAL: Guidance = Guidance {
    agent: "Decide whether a figure would genuinely help a student understand this question. If so, describe what to draw: every object, quantity and label mentioned in the question, and nothing that gives away the answer.",
    style: "Produce a clean, compact technical illustration on a white background. Label every given quantity with its symbol and value, use legible text that does not overlap, and keep the figure roughly square.",
    reviewer: "The image must be a clear technical figure that matches the question, with every given quantity labeled and legible.",
};

/// Instruction fragments for the three model-backed stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guidance {
    /// For the tool selection agent.
    pub agent: &'static str,
    /// For the rendering engines.
    pub style: &'static str,
    /// For the reviewer.
    pub reviewer: &'static str,
}

/// Owned guidance for one question, with advisory hints folded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedGuidance {
    pub agent: String,
    pub style: String,
    pub reviewer: String,
}

fn lookup(domain: Domain, diagram_type: DiagramType) -> Guidance {
    if is_valid_pair(domain, diagram_type) {
        if let Some(g) = entries::for_diagram_type(diagram_type) {
            return g;
        }
    }
    entries::for_domain(domain).unwrap_or(NEUTRAL)
}

/// Guidance for the tool selection agent.
pub fn agent_guidance(domain: Domain, diagram_type: DiagramType) -> &'static str {
    lookup(domain, diagram_type).agent
}

/// Style guidance handed to rendering engines.
pub fn generation_style_guidance(domain: Domain, diagram_type: DiagramType) -> &'static str {
    lookup(domain, diagram_type).style
}

/// Domain-specific rubric line for the reviewer.
pub fn reviewer_style_hint(domain: Domain, diagram_type: DiagramType) -> &'static str {
    lookup(domain, diagram_type).reviewer
}

/// Compose guidance for a classified question, biased by upstream hints.
pub fn compose(classification: &Classification, hints: &QuestionHints) -> ComposedGuidance {
    let base = lookup(classification.domain, classification.diagram_type);
    let mut agent = base.agent.to_string();
    let mut style = base.style.to_string();

    if hints.diagram_needed {
        agent.push_str(" The question author flagged this question as needing a figure.");
    }
    if let Some(caption) = hints.caption.as_deref().filter(|c| !c.trim().is_empty()) {
        agent.push_str(&format!(" Intended caption: \"{}\".", caption.trim()));
        style.push_str(&format!(" The figure should match the caption \"{}\".", caption.trim()));
    }

    ComposedGuidance {
        agent,
        style,
        reviewer: base.reviewer.to_string(),
    }
}

/// Ordered list of engines to try for a classification.
///
/// The generative engine is never included when `generative_suitable` is
/// false, whatever the caller's preference.
pub fn engine_order(classification: &Classification, preference: EnginePreference) -> Vec<ToolName> {
    let diagram_type = classification.diagram_type;
    let mut order = if diagram_type.prefers_schematic() {
        vec![ToolName::DrawSchematic, ToolName::PlotWithCode, ToolName::GenerateImage]
    } else if diagram_type.prefers_code() {
        vec![ToolName::PlotWithCode, ToolName::DrawSchematic, ToolName::GenerateImage]
    } else {
        vec![ToolName::GenerateImage, ToolName::PlotWithCode, ToolName::DrawSchematic]
    };

    if !classification.generative_suitable {
        order.retain(|t| t.is_code_based());
        return order;
    }

    match preference {
        EnginePreference::Auto => {}
        EnginePreference::PreferCode => {
            order.retain(|t| t.is_code_based());
            order.push(ToolName::GenerateImage);
        }
        EnginePreference::PreferGenerative => {
            order.retain(|t| t.is_code_based());
            order.insert(0, ToolName::GenerateImage);
        }
    }
    order
}

/// Check every registered fragment once at startup.
///
/// Returns the offending `(domain, diagram_type)` description on failure.
pub fn verify_registry() -> Result<(), String> {
    for domain in Domain::ALL {
        for diagram_type in DiagramType::ALL {
            let g = lookup(domain, diagram_type);
            for (stage, text) in [("agent", g.agent), ("style", g.style), ("reviewer", g.reviewer)] {
                if text.trim().is_empty() {
                    return Err(format!("empty {} guidance for ({}, {})", stage, domain, diagram_type));
                }
                let words = text.split_whitespace().count();
                if words > MAX_FRAGMENT_WORDS {
                    return Err(format!(
                        "{} guidance for ({}, {}) has {} words",
                        stage, domain, diagram_type, words
                    ));
                }
            }
        }
    }
    Ok(())
}
