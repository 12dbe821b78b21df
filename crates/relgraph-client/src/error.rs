use relgraph_core::GraphError;
use relgraph_http::HttpError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Http(#[from] HttpError),
}

pub type ClientResult<T> = Result<T, ClientError>;
