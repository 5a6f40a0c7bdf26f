// HTTP response utilities for JSON+Brotli encoding
use crate::application::errors::DataError;
use async_compression::tokio::bufread::BrotliEncoder;
use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Response, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;

/// `{ "ok": true, "data": ... }` on success, `{ "ok": false, "error": "..." }` on failure
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl std::fmt::Display) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

/// Check if the client accepts Brotli compression
pub fn accepts_brotli(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.contains("br"))
        .unwrap_or(false)
}

pub async fn brotli_compress(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = BrotliEncoder::new(bytes);
    let mut compressed = Vec::new();
    encoder.read_to_end(&mut compressed).await?;
    Ok(compressed)
}

/// Serialize a value to JSON, optionally compressing with Brotli
pub async fn json_response<T: Serialize>(
    value: &T,
    status: StatusCode,
    compress: bool,
) -> Result<Response<Body>, StatusCode> {
    let json_bytes = serde_json::to_vec(value).map_err(|e| {
        tracing::error!("JSON serialization error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let (body_bytes, content_encoding) = if compress {
        let compressed = brotli_compress(&json_bytes).await.map_err(|e| {
            tracing::error!("Brotli compression error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        tracing::debug!(
            "Compressed: {} → {} bytes",
            json_bytes.len(),
            compressed.len()
        );
        (compressed, Some("br"))
    } else {
        (json_bytes, None)
    };

    let mut response_builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, HeaderValue::from(body_bytes.len()));

    if let Some(encoding) = content_encoding {
        response_builder = response_builder.header(header::CONTENT_ENCODING, encoding);
    }

    response_builder.body(Body::from(body_bytes)).map_err(|e| {
        tracing::error!("Response build error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

pub fn status_for(error: &DataError) -> StatusCode {
    match error {
        DataError::Unauthorized => StatusCode::UNAUTHORIZED,
        DataError::Status { .. } | DataError::Transport(_) | DataError::Backend(_) => {
            StatusCode::BAD_GATEWAY
        }
        DataError::Decode { .. } | DataError::Encode { .. } => StatusCode::BAD_GATEWAY,
        DataError::Store(_) | DataError::UnknownKey(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Render a data source result as an envelope response
pub async fn envelope_response<T: Serialize>(
    result: Result<T, DataError>,
    compress: bool,
) -> Response<Body> {
    let rendered = match result {
        Ok(data) => json_response(&ApiEnvelope::success(data), StatusCode::OK, compress).await,
        Err(e) => {
            tracing::error!("Request failed: {}", e);
            json_response(&ApiEnvelope::<()>::failure(&e), status_for(&e), compress).await
        }
    };

    match rendered {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
