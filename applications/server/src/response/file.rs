//! Byte-range aware file responses

use super::range;
use crate::api::request::RequestHead;
use crate::api::ApiError;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, RANGE};
use axum::http::{HeaderValue, Method, Response, StatusCode};
use std::io::{self, SeekFrom};
use std::path::PathBuf;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// A byte-addressable resource that can be streamed in slices
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// Total size in bytes
    async fn stat(&self) -> io::Result<u64>;

    /// Open the inclusive interval `start..=end` for reading
    async fn open_range(
        &self,
        start: u64,
        end: u64,
    ) -> io::Result<Pin<Box<dyn AsyncRead + Send>>>;

    /// MIME type sent with the bytes
    fn content_type(&self) -> String;
}

/// A file on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ByteSource for LocalFile {
    async fn stat(&self) -> io::Result<u64> {
        Ok(tokio::fs::metadata(&self.path).await?.len())
    }

    async fn open_range(
        &self,
        start: u64,
        end: u64,
    ) -> io::Result<Pin<Box<dyn AsyncRead + Send>>> {
        let mut file = tokio::fs::File::open(&self.path).await?;
        file.seek(SeekFrom::Start(start)).await?;
        Ok(Box::pin(file.take(end - start + 1)))
    }

    fn content_type(&self) -> String {
        mime_guess::from_path(&self.path)
            .first_or_octet_stream()
            .to_string()
    }
}

/// Streams a [`ByteSource`], honouring a single-interval `Range` request
pub struct FileResponse {
    source: Box<dyn ByteSource>,
    status: StatusCode,
}

impl std::fmt::Debug for FileResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileResponse")
            .field("content_type", &self.source.content_type())
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl FileResponse {
    pub fn new(source: impl ByteSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            status: StatusCode::OK,
        }
    }

    /// Override the status; ranges are only honoured for `200 OK`
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub(crate) async fn render(self, head: &RequestHead) -> Result<Response<Body>, ApiError> {
        let size = match self.source.stat().await {
            Ok(size) => size,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ApiError::NotFound("File not found".to_string()));
            }
            Err(err) => return Err(ApiError::internal(err)),
        };

        let requested = head
            .headers
            .get(RANGE)
            .and_then(|value| value.to_str().ok())
            .filter(|_| self.status == StatusCode::OK);

        let partial = match requested {
            Some(header) => {
                range::resolve(header, size).map_err(|err| ApiError::from_range(err, size))?
            }
            None => None,
        };

        let (status, start, end) = match partial {
            Some(range) => (StatusCode::PARTIAL_CONTENT, range.start, range.end),
            None => (self.status, 0, size.saturating_sub(1)),
        };
        let length = if size == 0 { 0 } else { end - start + 1 };

        let body = if head.method == Method::HEAD || length == 0 {
            Body::empty()
        } else {
            let reader = self
                .source
                .open_range(start, end)
                .await
                .map_err(ApiError::internal)?;
            Body::from_stream(ReaderStream::new(reader))
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        let headers = response.headers_mut();
        if let Ok(content_type) = HeaderValue::from_str(&self.source.content_type()) {
            headers.insert(CONTENT_TYPE, content_type);
        }
        headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
        if let Some(range) = partial {
            if let Ok(content_range) = HeaderValue::from_str(&range.content_range(size)) {
                headers.insert(CONTENT_RANGE, content_range);
            }
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_file_reads_inclusive_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        std::fs::write(&path, b"0123456789").unwrap();

        let file = LocalFile::new(&path);
        assert_eq!(file.stat().await.unwrap(), 10);
        assert_eq!(file.content_type(), "audio/mpeg");

        let mut reader = file.open_range(2, 5).await.unwrap();
        let mut slice = Vec::new();
        reader.read_to_end(&mut slice).await.unwrap();
        assert_eq!(slice, b"2345");
    }

    #[tokio::test]
    async fn missing_file_stat_is_not_found() {
        let file = LocalFile::new("/nonexistent/prelude/file.flac");
        let err = file.stat().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    fn head_with_range(range: &str) -> RequestHead {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(RANGE, HeaderValue::from_str(range).unwrap());
        RequestHead {
            method: Method::GET,
            uri: "/tracks/t1/audio".parse().unwrap(),
            headers,
            remote: None,
        }
    }

    #[tokio::test]
    async fn range_is_served_for_default_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        std::fs::write(&path, b"0123456789").unwrap();

        let response = FileResponse::new(LocalFile::new(&path))
            .render(&head_with_range("bytes=0-1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[CONTENT_RANGE], "bytes 0-1/10");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"01");
    }

    #[tokio::test]
    async fn range_is_ignored_for_other_statuses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        std::fs::write(&path, b"0123456789").unwrap();

        let response = FileResponse::new(LocalFile::new(&path))
            .with_status(StatusCode::CREATED)
            .render(&head_with_range("bytes=0-1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().get(CONTENT_RANGE).is_none());
        assert_eq!(response.headers()[CONTENT_LENGTH], "10");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"0123456789");
    }

    #[test]
    fn unknown_extension_is_octet_stream() {
        assert_eq!(
            LocalFile::new("track.unknownext").content_type(),
            "application/octet-stream"
        );
    }
}
