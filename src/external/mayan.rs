//! Document storage service (Mayan EDMS) client.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::config::StorageConfig;
use crate::external::http::{build_client, join_url, send_json, HttpClientRequestError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExternalResultStatus {
    Success,
    Error,
}

/// Envelope for responses proxied from the storage service. Failures are
/// reported in-band with the upstream message instead of as an HTTP error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalResult<T> {
    pub status: ExternalResultStatus,
    pub message: Option<String>,
    pub payload: Option<T>,
}

impl<T> ExternalResult<T> {
    pub fn success(payload: T) -> Self {
        Self {
            status: ExternalResultStatus::Success,
            message: None,
            payload: Some(payload),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ExternalResultStatus::Error,
            message: Some(message.into()),
            payload: None,
        }
    }

    pub fn from_result(result: Result<T, HttpClientRequestError>) -> Self {
        match result {
            Ok(payload) => Self::success(payload),
            Err(e) => {
                log::warn!("Document storage request failed: {}", e);
                Self::error(e.body.clone().unwrap_or(e.message))
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExternalResultStatus::Success
    }
}

/// Paged listing as returned by the storage service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: i64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDetail {
    pub id: i64,
    pub filename: String,
    pub mimetype: Option<String>,
    pub size: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageDocument {
    pub id: i64,
    pub label: String,
    pub document_type: Label,
    pub file_latest: Option<FileDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataType {
    pub id: i64,
    pub name: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTypeMetadataType {
    pub id: i64,
    pub metadata_type: MetadataType,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub id: i64,
    pub metadata_type: MetadataType,
    pub value: Option<String>,
}

/// A downloaded file, contents base64 encoded for JSON transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDownload {
    pub file_name: String,
    pub mimetype: Option<String>,
    pub size: usize,
    pub file_pdf_base64: String,
}

impl FileDownload {
    pub fn new(file_name: String, mimetype: Option<String>, contents: &[u8]) -> Self {
        Self {
            file_name,
            mimetype,
            size: contents.len(),
            file_pdf_base64: base64::engine::general_purpose::STANDARD.encode(contents),
        }
    }
}

#[async_trait::async_trait]
pub trait DocumentStorageClient: Send + Sync {
    async fn upload_document(
        &self,
        document_type_id: i64,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<StorageDocument, HttpClientRequestError>;
    async fn delete_document(&self, document_id: i64) -> Result<(), HttpClientRequestError>;
    async fn get_document_type_metadata(
        &self,
        document_type_id: i64,
    ) -> Result<QueryResult<DocumentTypeMetadataType>, HttpClientRequestError>;
    async fn get_document_metadata(
        &self,
        document_id: i64,
    ) -> Result<QueryResult<DocumentMetadata>, HttpClientRequestError>;
    async fn add_document_metadata(
        &self,
        document_id: i64,
        metadata_type_id: i64,
        value: &str,
    ) -> Result<DocumentMetadata, HttpClientRequestError>;
    async fn download_file(&self, document_id: i64, file_id: i64) -> Result<FileDownload, HttpClientRequestError>;
    async fn download_latest_file(&self, document_id: i64) -> Result<FileDownload, HttpClientRequestError>;
}

pub struct HttpDocumentStorageClient {
    client: reqwest::Client,
    config: StorageConfig,
}

impl HttpDocumentStorageClient {
    pub fn new(config: StorageConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            config,
        })
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.config.host, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header("Authorization", format!("Token {}", self.config.token))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, HttpClientRequestError> {
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| HttpClientRequestError::transport(url, e))?;
        if !response.status().is_success() {
            return Err(HttpClientRequestError::from_response(response).await);
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| HttpClientRequestError::decode(url, e))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait::async_trait]
impl DocumentStorageClient for HttpDocumentStorageClient {
    async fn upload_document(
        &self,
        document_type_id: i64,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<StorageDocument, HttpClientRequestError> {
        let url = self.url("documents/upload/");
        let part = reqwest::multipart::Part::bytes(contents).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .text("document_type_id", document_type_id.to_string())
            .part("file", part);
        send_json(self.authorized(self.client.post(&url)).multipart(form), &url).await
    }

    async fn delete_document(&self, document_id: i64) -> Result<(), HttpClientRequestError> {
        let url = self.url(&format!("documents/{}/", document_id));
        let response = self
            .authorized(self.client.delete(&url))
            .send()
            .await
            .map_err(|e| HttpClientRequestError::transport(&url, e))?;
        if !response.status().is_success() {
            return Err(HttpClientRequestError::from_response(response).await);
        }
        Ok(())
    }

    async fn get_document_type_metadata(
        &self,
        document_type_id: i64,
    ) -> Result<QueryResult<DocumentTypeMetadataType>, HttpClientRequestError> {
        let url = self.url(&format!("document_types/{}/metadata_types/", document_type_id));
        send_json(self.authorized(self.client.get(&url)), &url).await
    }

    async fn get_document_metadata(
        &self,
        document_id: i64,
    ) -> Result<QueryResult<DocumentMetadata>, HttpClientRequestError> {
        let url = self.url(&format!("documents/{}/metadata/", document_id));
        send_json(self.authorized(self.client.get(&url)), &url).await
    }

    async fn add_document_metadata(
        &self,
        document_id: i64,
        metadata_type_id: i64,
        value: &str,
    ) -> Result<DocumentMetadata, HttpClientRequestError> {
        let url = self.url(&format!("documents/{}/metadata/", document_id));
        let body = serde_json::json!({ "metadata_type_id": metadata_type_id, "value": value });
        send_json(self.authorized(self.client.post(&url)).json(&body), &url).await
    }

    async fn download_file(&self, document_id: i64, file_id: i64) -> Result<FileDownload, HttpClientRequestError> {
        let detail_url = self.url(&format!("documents/{}/files/{}/", document_id, file_id));
        let detail: FileDetail = send_json(self.authorized(self.client.get(&detail_url)), &detail_url).await?;
        let contents = self
            .fetch_bytes(&self.url(&format!("documents/{}/files/{}/download/", document_id, file_id)))
            .await?;
        Ok(FileDownload::new(detail.filename, detail.mimetype, &contents))
    }

    async fn download_latest_file(&self, document_id: i64) -> Result<FileDownload, HttpClientRequestError> {
        let url = self.url(&format!("documents/{}/", document_id));
        let document: StorageDocument = send_json(self.authorized(self.client.get(&url)), &url).await?;
        let Some(latest) = document.file_latest else {
            return Err(HttpClientRequestError {
                url,
                status: None,
                body: None,
                message: format!("document {} has no files", document_id),
            });
        };
        self.download_file(document_id, latest.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_request_becomes_error_result() {
        let result: ExternalResult<i32> = ExternalResult::from_result(Err(HttpClientRequestError {
            url: "http://storage.test/documents/1/".to_string(),
            status: Some(404),
            body: Some("{\"detail\":\"Not found.\"}".to_string()),
            message: "upstream responded with 404 Not Found".to_string(),
        }));
        assert!(!result.is_success());
        assert_eq!(result.message.as_deref(), Some("{\"detail\":\"Not found.\"}"));
        assert!(result.payload.is_none());
    }

    #[test]
    fn download_encodes_contents() {
        let download = FileDownload::new("a.txt".to_string(), None, b"hello");
        assert_eq!(download.size, 5);
        assert_eq!(download.file_pdf_base64, "aGVsbG8=");
    }
}
