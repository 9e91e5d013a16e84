//! Classify command implementation

use crate::agent::factory::create_agent;
use crate::classifier::DomainClassifier;
use crate::cli::output::{format_classification_json, format_classification_table};
use crate::cli::serve::{build_http_client, load_config};
use crate::cli::ClassifyArgs;
use crate::composer;
use crate::question::EnginePreference;
use std::sync::Arc;
use std::time::Duration;

/// Handle `plotwise classify`
pub async fn handle_classify(args: &ClassifyArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = load_config(&args.config)?;
    config.validate()?;

    let stage = &config.models.classifier;
    let endpoint = config
        .endpoint(&stage.endpoint)
        .ok_or_else(|| format!("Unknown model endpoint '{}'", stage.endpoint))?;
    let client = Arc::new(build_http_client(&config)?);
    let agent = create_agent(endpoint, client)?;

    let classifier = DomainClassifier::new(
        agent,
        stage.model.clone(),
        Duration::from_secs(stage.timeout_seconds),
    );
    let classification = classifier.classify(&args.text, args.subject.as_deref()).await;
    let engines = composer::engine_order(&classification, EnginePreference::Auto);

    if args.json {
        Ok(format_classification_json(&classification, &engines)?)
    } else {
        Ok(format_classification_table(&classification, &engines))
    }
}
