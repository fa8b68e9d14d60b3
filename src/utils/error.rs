use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Disc metadata error: {message}")]
    Metadata { message: String },

    #[error("Index out of range: {message}")]
    IndexOutOfRange { message: String },

    #[error("External tool error: {message}")]
    Tool { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl Error {
    pub fn metadata<T: Into<String>>(message: T) -> Self {
        Self::Metadata {
            message: message.into(),
        }
    }

    pub fn index_out_of_range<T: Into<String>>(message: T) -> Self {
        Self::IndexOutOfRange {
            message: message.into(),
        }
    }

    pub fn tool<T: Into<String>>(message: T) -> Self {
        Self::Tool {
            message: message.into(),
        }
    }

    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
