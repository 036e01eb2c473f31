//! Error types for model loading and configuration

use std::fmt;

/// Error type for model loading
#[derive(Debug)]
pub enum LoadError {
    /// Asset could not be fetched
    Io(String),
    /// glTF/GLB parse error
    Gltf(gltf::Error),
    /// A buffer the model refers to is absent or too short
    MissingBuffer { index: usize, reason: String },
    /// A `data:` URI that is not base64 or fails to decode
    BadDataUri(String),
    /// A primitive without vertex positions
    MissingPositions { mesh: String },
    /// The file declares no scene to show
    EmptyScene,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(msg) => write!(f, "I/O error: {}", msg),
            LoadError::Gltf(e) => write!(f, "glTF error: {}", e),
            LoadError::MissingBuffer { index, reason } => {
                write!(f, "buffer {} unavailable: {}", index, reason)
            }
            LoadError::BadDataUri(msg) => write!(f, "bad data URI: {}", msg),
            LoadError::MissingPositions { mesh } => {
                write!(f, "mesh '{}' has a primitive without positions", mesh)
            }
            LoadError::EmptyScene => write!(f, "model contains no scene"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Gltf(e) => Some(e),
            _ => None,
        }
    }
}

impl From<gltf::Error> for LoadError {
    fn from(e: gltf::Error) -> Self {
        LoadError::Gltf(e)
    }
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e.to_string())
    }
}

/// Error type for viewer configuration
#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    ValidationError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(e: ron::error::SpannedError) -> Self {
        ConfigError::ParseError(e)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Parse error: {}", e),
            ConfigError::ValidationError(e) => write!(f, "Validation error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
