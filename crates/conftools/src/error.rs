#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{0} environment variable not set")]
    MissingEnv(&'static str),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}
