use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the pdfqa server and CLI.
#[derive(Debug, Clone)]
pub struct Config {
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Backend holding the uploaded PDF blobs.
    pub blob_store: BlobStoreKind,
    /// Bucket used when `blob_store` is S3.
    pub s3_bucket: Option<String>,
    /// Optional AWS region override for the S3 client.
    pub aws_region: Option<String>,
    /// Optional S3-compatible endpoint (MinIO, R2, LocalStack).
    pub s3_endpoint_url: Option<String>,
    /// Directory backing the local blob store.
    pub local_blob_dir: PathBuf,
    /// Root of the per-request scratch area for downloaded documents.
    pub scratch_dir: PathBuf,
    /// Suffix a blob key must carry to be listed as a document.
    pub document_extension: String,
    /// Backend persisting extracted text.
    pub text_store: TextStoreKind,
    /// Google Cloud project hosting the Firestore database.
    pub firestore_project_id: Option<String>,
    /// Firestore collection that receives extracted text.
    pub firestore_collection: String,
    /// Base URL of the Firestore REST API (overridable for the emulator).
    pub firestore_base_url: String,
    /// Optional OAuth bearer token sent with Firestore requests.
    pub firestore_access_token: Option<String>,
    /// Directory backing the JSON file text store.
    pub text_store_dir: PathBuf,
    /// Provider answering questions.
    pub completion_provider: CompletionProvider,
    /// Model identifier passed to the completion provider.
    pub completion_model: String,
    /// API key for the OpenAI provider.
    pub openai_api_key: Option<String>,
    /// Optional override for the OpenAI-compatible base URL.
    pub openai_base_url: Option<String>,
    /// Optional override for the Ollama base URL.
    pub ollama_url: Option<String>,
    /// Output token budget for each answer.
    pub answer_max_tokens: u32,
    /// Sampling temperature for each answer.
    pub answer_temperature: f32,
    /// Number of questions answered concurrently within one batch.
    pub answer_concurrency: usize,
    /// Consult persisted text before re-extracting for question answering.
    pub read_through_text_store: bool,
}

/// Supported blob storage backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlobStoreKind {
    /// Amazon S3 or an S3-compatible service.
    S3,
    /// A directory on the local filesystem.
    Local,
}

/// Supported extracted-text stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextStoreKind {
    /// Google Firestore via its REST API.
    Firestore,
    /// One JSON file per document under a directory.
    File,
    /// Process-local map; contents are lost on exit.
    Memory,
}

/// Supported completion backends for answer synthesis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionProvider {
    /// OpenAI chat completions API (or a compatible server).
    OpenAI,
    /// Local Ollama runtime.
    Ollama,
}

const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let blob_store = parse_optional("BLOB_STORE")?.unwrap_or(BlobStoreKind::S3);
        let s3_bucket = load_env_optional("S3_BUCKET");
        if blob_store == BlobStoreKind::S3 && s3_bucket.is_none() {
            return Err(ConfigError::MissingVariable("S3_BUCKET".into()));
        }

        let text_store = parse_optional("TEXT_STORE")?.unwrap_or(TextStoreKind::Firestore);
        let firestore_project_id = load_env_optional("FIRESTORE_PROJECT_ID");
        if text_store == TextStoreKind::Firestore && firestore_project_id.is_none() {
            return Err(ConfigError::MissingVariable("FIRESTORE_PROJECT_ID".into()));
        }

        let completion_provider =
            parse_optional("COMPLETION_PROVIDER")?.unwrap_or(CompletionProvider::OpenAI);
        let openai_api_key = load_env_optional("OPENAI_API_KEY");
        if completion_provider == CompletionProvider::OpenAI && openai_api_key.is_none() {
            return Err(ConfigError::MissingVariable("OPENAI_API_KEY".into()));
        }

        let answer_temperature: f32 = parse_optional("ANSWER_TEMPERATURE")?.unwrap_or(0.5);
        if !(0.0..=2.0).contains(&answer_temperature) {
            return Err(ConfigError::InvalidValue("ANSWER_TEMPERATURE".into()));
        }

        Ok(Self {
            server_port: parse_optional("SERVER_PORT")?,
            blob_store,
            s3_bucket,
            aws_region: load_env_optional("AWS_REGION"),
            s3_endpoint_url: load_env_optional("S3_ENDPOINT_URL"),
            local_blob_dir: load_env_optional("LOCAL_BLOB_DIR")
                .unwrap_or_else(|| "./blobs".into())
                .into(),
            scratch_dir: load_env_optional("SCRATCH_DIR")
                .unwrap_or_else(|| "./uploads".into())
                .into(),
            document_extension: load_env_optional("DOCUMENT_EXTENSION")
                .unwrap_or_else(|| ".pdf".into()),
            text_store,
            firestore_project_id,
            firestore_collection: load_env_optional("FIRESTORE_COLLECTION")
                .unwrap_or_else(|| "pdf_texts".into()),
            firestore_base_url: load_env_optional("FIRESTORE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_FIRESTORE_BASE_URL.into()),
            firestore_access_token: load_env_optional("FIRESTORE_ACCESS_TOKEN"),
            text_store_dir: load_env_optional("TEXT_STORE_DIR")
                .unwrap_or_else(|| "./texts".into())
                .into(),
            completion_provider,
            completion_model: load_env_optional("COMPLETION_MODEL")
                .unwrap_or_else(|| "gpt-3.5-turbo".into()),
            openai_api_key,
            openai_base_url: load_env_optional("OPENAI_BASE_URL"),
            ollama_url: load_env_optional("OLLAMA_URL"),
            answer_max_tokens: parse_optional("ANSWER_MAX_TOKENS")?.unwrap_or(100),
            answer_temperature,
            answer_concurrency: parse_optional::<usize>("ANSWER_CONCURRENCY")?
                .unwrap_or(1)
                .max(1),
            read_through_text_store: load_env_optional("READ_THROUGH_TEXT_STORE")
                .map(|value| parse_bool("READ_THROUGH_TEXT_STORE", &value))
                .transpose()?
                .unwrap_or(false),
        })
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue(key.to_string())),
    }
}

impl std::str::FromStr for BlobStoreKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "local" => Ok(Self::Local),
            _ => Err(()),
        }
    }
}

impl std::str::FromStr for TextStoreKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

impl std::str::FromStr for CompletionProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, if [`init_config`] has run.
pub fn get_config() -> Option<&'static Config> {
    CONFIG.get()
}

/// Load configuration from the environment and install it in the global cache.
///
/// Reads a `.env` file first when one is present. Calling this twice returns the
/// configuration installed by the first call.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    if let Some(existing) = CONFIG.get() {
        return Ok(existing);
    }
    let config = Config::from_env()?;
    tracing::debug!(
        blob_store = ?config.blob_store,
        text_store = ?config.text_store,
        completion_provider = ?config.completion_provider,
        model = %config.completion_model,
        server_port = ?config.server_port,
        read_through = config.read_through_text_store,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}
