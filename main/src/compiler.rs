use std::{collections::BTreeMap, path::PathBuf};

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use common::utils::config::{get_config, AppConfig};

/// Compile the ingestion pipeline into a declarative definition for
/// deployment on a remote execution engine.
///
/// The definition wires the document provider's output artifact to the
/// chunk-and-load step's input artifact; it contains no ingestion logic.
#[derive(Debug, Parser)]
#[command(name = "compiler")]
struct CompilerArgs {
    /// Output path for the compiled pipeline definition
    #[arg(long, default_value = "pipelines/document_ingestion.yaml")]
    output: PathBuf,
}

#[derive(Debug, Serialize)]
struct PipelineDefinition {
    name: String,
    description: String,
    parameters: Vec<Parameter>,
    steps: Vec<Step>,
}

#[derive(Debug, Serialize)]
struct Parameter {
    name: String,
    default: serde_yaml::Value,
}

#[derive(Debug, Serialize)]
struct Step {
    name: String,
    component: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    inputs: BTreeMap<String, String>,
    outputs: Vec<String>,
}

fn param(name: &str, default: impl Into<serde_yaml::Value>) -> Parameter {
    Parameter {
        name: name.to_string(),
        default: default.into(),
    }
}

fn pipeline_definition(cfg: &AppConfig) -> PipelineDefinition {
    let parameters = vec![
        param("bucket_name", cfg.bucket_name.as_str()),
        param("bucket_endpoint", cfg.bucket_endpoint.as_str()),
        param("file_prefix", cfg.file_prefix.as_str()),
        param("file_extensions", cfg.file_extensions.as_str()),
        param(
            "max_files",
            u64::try_from(cfg.max_files).unwrap_or(u64::MAX),
        ),
        param("vector_db_url", cfg.vector_db_url.as_str()),
        param("embedding_model", cfg.embedding_model.as_str()),
        param(
            "embedding_dimension",
            u64::try_from(cfg.embedding_dimension).unwrap_or(u64::MAX),
        ),
        param("provider_id", cfg.provider_id.as_str()),
        param("vector_db_id", cfg.vector_db_id.as_str()),
    ];

    let provider = Step {
        name: "document-provider".to_string(),
        component: "document-provider".to_string(),
        inputs: BTreeMap::new(),
        outputs: vec!["documents".to_string()],
    };

    let mut processor_inputs = BTreeMap::new();
    processor_inputs.insert(
        "document_path".to_string(),
        "{{steps.document-provider.outputs.documents}}".to_string(),
    );
    let processor = Step {
        name: "chunk-and-load".to_string(),
        component: "chunk-and-load".to_string(),
        inputs: processor_inputs,
        outputs: vec!["metrics".to_string()],
    };

    PipelineDefinition {
        name: "document-ingestion".to_string(),
        description: "Fetch documents from the object store and load them into the vector database"
            .to_string(),
        parameters,
        steps: vec![provider, processor],
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let args = CompilerArgs::parse();
    let config = get_config()?;

    let definition = pipeline_definition(&config);
    let rendered = serde_yaml::to_string(&definition)?;

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(&args.output, rendered).await?;
    println!("Pipeline compiled successfully to {}", args.output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every AppConfig field carries a serde default.
    fn default_config() -> AppConfig {
        serde_json::from_str("{}").expect("config defaults")
    }

    #[test]
    fn definition_wires_provider_output_to_processor_input() {
        let definition = pipeline_definition(&default_config());

        assert_eq!(definition.steps.len(), 2);
        let provider = definition.steps.first().expect("provider step");
        assert_eq!(provider.outputs, vec!["documents"]);

        let processor = definition.steps.get(1).expect("processor step");
        assert_eq!(
            processor.inputs.get("document_path").map(String::as_str),
            Some("{{steps.document-provider.outputs.documents}}")
        );
    }

    #[test]
    fn definition_serializes_to_yaml() {
        let definition = pipeline_definition(&default_config());
        let rendered = serde_yaml::to_string(&definition).expect("serialize");

        assert!(rendered.contains("document-provider"));
        assert!(rendered.contains("chunk-and-load"));
        assert!(rendered.contains("vector_db_id"));
    }
}
