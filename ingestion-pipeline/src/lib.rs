#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod processor;
pub mod provider;
pub mod utils;
pub mod vector_store;

pub use processor::{DefaultProcessorServices, Processor, ProcessorConfig, ProcessorServices};
pub use provider::{local_files_manifest, DocumentProvider, ProviderConfig};
pub use vector_store::{CollectionSpec, HttpVectorStore, VectorStore};
