// Error types for the upload and mint steps. The UI only ever shows a
// generic failure notice; the variants here are what gets logged.

use std::path::PathBuf;

use thiserror::Error;

/// No usable response came back from a remote endpoint.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct TransportError(#[from] reqwest::Error);

/// Failure while pinning a file.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("selected file has no name")]
    EmptyFile,
    /// The pinning service answered with a non-success status.
    #[error("failed to upload file: {status} {status_text}")]
    Rejected { status: u16, status_text: String },
    #[error("pinning service response has no content hash: {0}")]
    MalformedResponse(String),
    #[error("pinning service unreachable: {0}")]
    Transport(#[from] TransportError),
}

/// Failure while talking to the wallet or submitting the mint call.
#[derive(Debug, Error)]
pub enum ContractCallError {
    #[error("token uri must not be empty")]
    EmptyLocator,
    #[error("wallet has no connected account")]
    NoAccount,
    /// JSON-RPC error object returned by the wallet (user rejection, RPC
    /// failure, broadcast failure).
    #[error("wallet rejected the request ({code}): {message}")]
    Rejected { code: i64, message: String },
    #[error("wallet is on chain {actual}, expected {expected}")]
    WrongChain { expected: u64, actual: u64 },
    #[error("unexpected wallet response: {0}")]
    InvalidResponse(String),
    #[error("wallet unreachable: {0}")]
    Transport(#[from] TransportError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration value `{0}`")]
    Missing(&'static str),
    #[error("invalid contract address `{0}`")]
    InvalidAddress(String),
    #[error("invalid chain id `{0}`")]
    InvalidChainId(String),
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Outcome of a failed upload-then-mint sequence.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("a wallet address and a selected file are required")]
    NotReady,
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Mint(#[from] ContractCallError),
}
