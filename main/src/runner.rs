use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use common::{
    storage::{store::StorageManager, types::metrics::ProcessingMetrics},
    utils::config::{get_config, AppConfig},
};
use ingestion_pipeline::{
    local_files_manifest, DefaultProcessorServices, DocumentProvider, HttpVectorStore, Processor,
    ProcessorConfig, ProviderConfig,
};

/// Run the ingestion pipeline in one process: fetch documents, then chunk
/// and load them into the vector database.
///
/// Values given here override the config file / environment configuration.
#[derive(Debug, Parser)]
#[command(name = "runner")]
struct RunnerArgs {
    /// Bucket holding the source documents
    #[arg(long)]
    bucket_name: Option<String>,

    /// Object-store endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Object-store access key
    #[arg(long, env = "BUCKET_ACCESS_KEY")]
    access_key: Option<String>,

    /// Object-store secret key
    #[arg(long, env = "BUCKET_SECRET_KEY")]
    secret_key: Option<String>,

    /// Only fetch keys with this prefix
    #[arg(long)]
    file_prefix: Option<String>,

    /// Comma-separated list of file extensions to fetch, e.g. ".pdf,.docx,.txt"
    #[arg(long)]
    file_extensions: Option<String>,

    /// Maximum number of files to download
    #[arg(long)]
    max_files: Option<usize>,

    /// Directory to download files to (defaults to the run's temp dir)
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// URL of the vector-database service
    #[arg(long)]
    vector_db_url: Option<String>,

    /// Credential for the vector-database service
    #[arg(long, env = "VECTOR_DB_API_KEY")]
    vector_db_api_key: Option<String>,

    /// Model to use for embeddings
    #[arg(long)]
    embedding_model: Option<String>,

    /// Dimension size for embeddings
    #[arg(long)]
    embedding_dimension: Option<usize>,

    /// Provider ID for the vector database
    #[arg(long)]
    provider_id: Option<String>,

    /// ID of the target vector collection
    #[arg(long)]
    vector_db_id: Option<String>,

    /// Use local files instead of fetching from the bucket
    #[arg(long)]
    use_local_files: bool,

    /// Directory containing local files to process
    #[arg(long)]
    local_files_dir: Option<PathBuf>,

    /// Keep the temporary working directory after the run
    #[arg(long)]
    no_cleanup: bool,
}

fn apply_overrides(config: &mut AppConfig, args: &RunnerArgs) {
    if let Some(bucket_name) = &args.bucket_name {
        config.bucket_name = bucket_name.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        config.bucket_endpoint = endpoint.clone();
    }
    if let Some(access_key) = &args.access_key {
        config.bucket_access_key = access_key.clone();
    }
    if let Some(secret_key) = &args.secret_key {
        config.bucket_secret_key = secret_key.clone();
    }
    if let Some(file_prefix) = &args.file_prefix {
        config.file_prefix = file_prefix.clone();
    }
    if let Some(file_extensions) = &args.file_extensions {
        config.file_extensions = file_extensions.clone();
    }
    if let Some(max_files) = args.max_files {
        config.max_files = max_files;
    }
    if let Some(vector_db_url) = &args.vector_db_url {
        config.vector_db_url = vector_db_url.clone();
    }
    if let Some(vector_db_api_key) = &args.vector_db_api_key {
        config.vector_db_api_key = Some(vector_db_api_key.clone());
    }
    if let Some(embedding_model) = &args.embedding_model {
        config.embedding_model = embedding_model.clone();
    }
    if let Some(embedding_dimension) = args.embedding_dimension {
        config.embedding_dimension = embedding_dimension;
    }
    if let Some(provider_id) = &args.provider_id {
        config.provider_id = provider_id.clone();
    }
    if let Some(vector_db_id) = &args.vector_db_id {
        config.vector_db_id = vector_db_id.clone();
    }
}

fn print_summary(metrics: &ProcessingMetrics) {
    println!("Document count: {}", metrics.document_count);
    println!("Total chunks: {}", metrics.total_chunks);
    let registration = metrics
        .vector_db_registration
        .as_ref()
        .map_or_else(|| "unknown".to_string(), ToString::to_string);
    let insertion = metrics
        .vector_db_insertion
        .as_ref()
        .map_or_else(|| "unknown".to_string(), ToString::to_string);
    println!("Vector DB registration: {registration}");
    println!("Vector DB insertion: {insertion}");

    if !metrics.failed_documents.is_empty() {
        println!("Failed documents ({}):", metrics.failed_documents.len());
        for doc in &metrics.failed_documents {
            println!("  - {}: {}", doc.file, doc.error);
        }
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

    let args = RunnerArgs::parse();
    let mut config = get_config()?;
    apply_overrides(&mut config, &args);

    let temp_dir = tempfile::Builder::new()
        .prefix("ingestion_pipeline_")
        .tempdir()?;
    println!("Using temporary directory: {}", temp_dir.path().display());

    let manifest_path = temp_dir.path().join("document_provider_output.json");
    let metrics_path = temp_dir.path().join("metrics.json");

    let manifest = if args.use_local_files {
        let dir = args
            .local_files_dir
            .as_deref()
            .context("--local-files-dir must be provided with --use-local-files")?;
        local_files_manifest(dir, &config.extension_list()).await?
    } else {
        let download_dir = args
            .download_dir
            .clone()
            .unwrap_or_else(|| temp_dir.path().join("downloads"));
        let provider_config = ProviderConfig {
            download_dir,
            ..ProviderConfig::from_app_config(&config)
        };
        let storage = StorageManager::new(&config).await?;
        DocumentProvider::new(storage, provider_config).fetch().await?
    };
    manifest.write(&manifest_path).await?;
    println!("Fetched {} documents", manifest.metadata.file_count);

    let services = Arc::new(DefaultProcessorServices::default());
    let vector_store = Arc::new(HttpVectorStore::from_app_config(&config)?);
    let processor = Processor::new(
        services,
        vector_store,
        ProcessorConfig::from_app_config(&config),
    );
    let total_chunks = processor.run(&manifest_path, &metrics_path).await?;

    let metrics = ProcessingMetrics::read(&metrics_path).await?;
    print_summary(&metrics);
    println!("Pipeline completed: {total_chunks} chunks ingested");

    if args.no_cleanup {
        let kept = temp_dir.into_path();
        println!("Temporary directory preserved at: {}", kept.display());
    }

    Ok(())
}
