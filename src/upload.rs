// Pinning client: a small blocking HTTP client that uploads one file to
// the Pinata API and turns the returned hash into a locator.

use anyhow::{Context, Result};
use reqwest::blocking::{multipart, Client};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::MintConfig;
use crate::error::{TransportError, UploadError};
use crate::types::{ContentLocator, SelectedFile};

/// Anything that can store a file and hand back its locator.
pub trait FileUploader {
    fn upload(&self, file: &SelectedFile) -> Result<ContentLocator, UploadError>;
}

/// Subset of the `pinFileToIPFS` response we rely on.
#[derive(Deserialize, Debug)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

/// Uploader bound to a single pinning endpoint and bearer token.
#[derive(Clone)]
pub struct Uploader {
    client: Client,
    endpoint: String,
    scheme: String,
    headers: HeaderMap,
}

impl Uploader {
    pub fn new(config: &MintConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Uploader {
            client,
            endpoint: config.pinning_endpoint.clone(),
            scheme: config.locator_scheme.clone(),
            headers: auth_headers(&config.pinata_jwt)?,
        })
    }
}

/// Authorization header for the pinning service. The value is marked
/// sensitive so it never shows up in debug output.
fn auth_headers(token: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let mut val = HeaderValue::from_str(&format!("Bearer {}", token))
        .context("Pinning token contains characters not allowed in a header")?;
    val.set_sensitive(true);
    headers.insert(AUTHORIZATION, val);
    Ok(headers)
}

impl FileUploader for Uploader {
    /// POST the file as multipart field `file`. A non-success status is
    /// terminal; nothing is retried.
    fn upload(&self, file: &SelectedFile) -> Result<ContentLocator, UploadError> {
        if file.name().is_empty() {
            return Err(UploadError::EmptyFile);
        }

        let part = multipart::Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.mime().as_ref())
            .map_err(TransportError::from)?;
        let form = multipart::Form::new().part("file", part);

        debug!(endpoint = %self.endpoint, file = file.name(), size = file.size(), "pinning file");
        let res = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .multipart(form)
            .send()
            .map_err(TransportError::from)?;

        let status = res.status();
        if !status.is_success() {
            let status_text = status.canonical_reason().unwrap_or_default().to_string();
            warn!(status = status.as_u16(), %status_text, "pinning service rejected upload");
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                status_text,
            });
        }

        let body = res.text().map_err(TransportError::from)?;
        let pinned: PinResponse = serde_json::from_str(&body)
            .map_err(|e| UploadError::MalformedResponse(e.to_string()))?;
        if pinned.ipfs_hash.is_empty() {
            return Err(UploadError::MalformedResponse("empty IpfsHash".into()));
        }

        let locator = ContentLocator::new(&self.scheme, &pinned.ipfs_hash, file.name());
        info!(%locator, "file pinned");
        Ok(locator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use mockito::Matcher;

    const PIN_PATH: &str = "/pinning/pinFileToIPFS";

    fn uploader_for(server: &mockito::ServerGuard) -> Uploader {
        let mut config = MintConfig::with_defaults("test-jwt", Address::ZERO);
        config.pinning_endpoint = format!("{}{}", server.url(), PIN_PATH);
        Uploader::new(&config).unwrap()
    }

    #[test]
    fn upload_returns_locator_with_file_name() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", PIN_PATH)
            .match_header("authorization", "Bearer test-jwt")
            .match_header("content-type", Matcher::Regex("^multipart/form-data".into()))
            .match_body(Matcher::Regex(r#"name="file"; filename="cat.png""#.into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"IpfsHash":"Qm123","PinSize":4,"Timestamp":"2024-01-01T00:00:00Z"}"#)
            .create();

        let locator = uploader_for(&server)
            .upload(&SelectedFile::new("cat.png", b"meow".to_vec()))
            .unwrap();

        mock.assert();
        assert_eq!(locator.as_str(), "ipfs://Qm123/cat.png");
        assert!(locator.as_str().ends_with("cat.png"));
    }

    #[test]
    fn non_success_status_is_rejected() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", PIN_PATH)
            .with_status(413)
            .with_body("too big")
            .create();

        let err = uploader_for(&server)
            .upload(&SelectedFile::new("cat.png", vec![0; 16]))
            .unwrap_err();

        match err {
            UploadError::Rejected {
                status,
                status_text,
            } => {
                assert_eq!(status, 413);
                assert_eq!(status_text, "Payload Too Large");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unauthorized_is_rejected() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("POST", PIN_PATH).with_status(401).create();

        let err = uploader_for(&server)
            .upload(&SelectedFile::new("cat.png", vec![1]))
            .unwrap_err();
        assert!(matches!(err, UploadError::Rejected { status: 401, .. }));
    }

    #[test]
    fn missing_hash_is_malformed() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", PIN_PATH)
            .with_status(200)
            .with_body(r#"{"PinSize":4}"#)
            .create();

        let err = uploader_for(&server)
            .upload(&SelectedFile::new("cat.png", vec![1]))
            .unwrap_err();
        assert!(matches!(err, UploadError::MalformedResponse(_)));
    }

    #[test]
    fn unreachable_endpoint_is_transport_error() {
        let mut config = MintConfig::with_defaults("test-jwt", Address::ZERO);
        config.pinning_endpoint = "http://127.0.0.1:1/pinning/pinFileToIPFS".into();
        let err = Uploader::new(&config)
            .unwrap()
            .upload(&SelectedFile::new("cat.png", vec![1]))
            .unwrap_err();
        assert!(matches!(err, UploadError::Transport(_)));
    }

    #[test]
    fn nameless_file_is_refused_locally() {
        let server = mockito::Server::new();
        let err = uploader_for(&server)
            .upload(&SelectedFile::new("", vec![1]))
            .unwrap_err();
        assert!(matches!(err, UploadError::EmptyFile));
    }

    #[test]
    fn token_with_newline_fails_construction() {
        let config = MintConfig::with_defaults("bad\ntoken", Address::ZERO);
        assert!(Uploader::new(&config).is_err());
    }
}
