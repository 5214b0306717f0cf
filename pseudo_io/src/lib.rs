/*!
Input and output around the `nerview` core: text extraction from uploaded documents, the client
of the pseudonymization service and the loading of evaluation directories. Everything here is
blocking.
*/

mod client;
mod evaluation;
mod ingest;

pub use client::{
    parse_pseudo_response, parse_stats_response, parse_tags_response, ClientConfig, Prediction,
    PredictionError, PseudoApiClient, Pseudonymizer, Tagger, DEFAULT_TIMEOUT_SECS, TIMEOUT_VAR,
    URL_VAR,
};
pub use evaluation::{evaluate_dir, read_evaluation_dir, LoadError};
pub use ingest::{DocumentFormat, DocumentIngestor, FileIngestor, IngestError};
