//! Guidance command implementation

use crate::cli::output::{format_guidance_json, format_guidance_table, GuidanceView};
use crate::cli::GuidanceArgs;
use crate::composer;
use crate::question::QuestionHints;
use crate::taxonomy::{Classification, Complexity, DiagramType, Domain};

/// Handle `plotwise guidance`. Needs no model access.
pub fn handle_guidance(args: &GuidanceArgs) -> Result<String, Box<dyn std::error::Error>> {
    let domain: Domain = args.domain.parse()?;
    let diagram_type: DiagramType = args.diagram_type.parse()?;

    let classification =
        Classification::new(domain, diagram_type, Complexity::Moderate, !args.code_only);
    let guidance = composer::compose(&classification, &QuestionHints::default());

    let view = GuidanceView {
        domain: classification.domain.to_string(),
        diagram_type: classification.diagram_type.to_string(),
        agent_guidance: guidance.agent,
        generation_style_guidance: guidance.style,
        reviewer_style_hint: guidance.reviewer,
        engines: composer::engine_order(&classification, args.engine),
    };

    if args.json {
        Ok(format_guidance_json(&view)?)
    } else {
        Ok(format_guidance_table(&view))
    }
}
