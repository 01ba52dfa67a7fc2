/// Error type shared by asset decoding and configuration loading
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Reading an asset or config file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary STL shorter than its header or declared triangle count
    #[error("STL data truncated: expected {expected} bytes, got {actual}")]
    TruncatedStl { expected: usize, actual: usize },

    /// ASCII STL that does not follow the solid/facet grammar
    #[error("Malformed ASCII STL: {0}")]
    StlSyntax(String),

    /// glTF document or buffer could not be imported
    #[error("glTF import failed: {0}")]
    Gltf(#[from] gltf::Error),

    /// Asset bytes or extension matched no known decoder
    #[error("Unsupported model format: {0}")]
    UnsupportedFormat(String),

    /// A configuration value outside its allowed domain
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A background loader stopped without delivering a model
    #[error("Model loader failed: {0}")]
    Loader(String),

    /// Config JSON that does not deserialize
    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
