//! # Context Gateway
//!
//! Builds the aggregated prompt from selected files and exchanges it with a
//! chat-completion endpoint.
//!
//! ```text
//! prompt + [path]
//!     │
//!     ├──> read_many (one read per file, order kept)
//!     ├──> aggregate (delimited file sections)
//!     └──> CompletionClient (system instruction + one user message)
//!            └─> answer text
//! ```

mod aggregate;
mod client;
mod config;
mod error;
mod gateway;

pub use aggregate::{aggregate, AggregatedPayload, FileSection, FILES_LEAD_IN, SECTION_DELIMITER};
pub use client::{extract_answer, ChatCompletionsClient, CompletionClient};
pub use config::{
    GatewayConfig, API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL, MODEL_ENV,
};
pub use error::GatewayError;
pub use gateway::{ModelGateway, ModelResult, SYSTEM_INSTRUCTION};
