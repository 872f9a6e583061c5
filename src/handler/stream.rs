use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, header::HeaderName, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
};
use std::io::SeekFrom;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::app::AppState;
use crate::error::AppError;

static VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Byte span parsed from `Range: bytes=<start>-[<end>]`. Both bounds are
/// inclusive; `end` is clamped to the last byte of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RangeSpan {
    start: u64,
    end: u64,
}

impl RangeSpan {
    fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Parse a Range header against a file of `size` bytes.
///
/// `start` is required, so the suffix form (`bytes=-N`) does not parse.
/// `None` covers both malformed syntax and spans no byte of the file
/// can satisfy.
fn parse_range_header(value: &str, size: u64) -> Option<RangeSpan> {
    let rest = value.trim().strip_prefix("bytes=")?;
    let (start_str, end_str) = rest.split_once('-')?;
    let start: u64 = start_str.trim().parse().ok()?;
    let end = if end_str.trim().is_empty() {
        size.checked_sub(1)?
    } else {
        end_str
            .trim()
            .parse::<u64>()
            .ok()?
            .min(size.saturating_sub(1))
    };
    if start > end || start >= size {
        return None;
    }
    Some(RangeSpan { start, end })
}

fn response_meta(span: Option<&RangeSpan>, size: u64) -> (StatusCode, Vec<(HeaderName, String)>) {
    let mut headers = vec![
        (header::CONTENT_TYPE, VIDEO_CONTENT_TYPE.to_string()),
        (header::ACCEPT_RANGES, "bytes".to_string()),
    ];
    match span {
        None => {
            headers.push((header::CONTENT_LENGTH, size.to_string()));
            (StatusCode::OK, headers)
        }
        Some(span) => {
            headers.push((header::CONTENT_LENGTH, span.len().to_string()));
            headers.push((
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", span.start, span.end, size),
            ));
            (StatusCode::PARTIAL_CONTENT, headers)
        }
    }
}

fn requested_span(
    headers: &HeaderMap,
    size: u64,
) -> Result<Option<RangeSpan>, AppError> {
    match headers.get(header::RANGE).and_then(|v| v.to_str().ok()) {
        Some(raw) => {
            let span = parse_range_header(raw, size).ok_or_else(|| AppError::InvalidRange {
                spec: raw.to_string(),
                size,
            })?;
            Ok(Some(span))
        }
        None => Ok(None),
    }
}

/// Serves a committed file with single-range support.
pub async fn stream_media(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let (mut file, size) = state
        .store
        .open(&name)
        .await?
        .ok_or_else(|| AppError::NotFound(name.clone()))?;

    let span = requested_span(&headers, size)?;
    let (status, resp_headers) = response_meta(span.as_ref(), size);

    let body = match span {
        None => {
            debug!("stream: {} full {} bytes", name, size);
            Body::from_stream(ReaderStream::new(file))
        }
        Some(span) => {
            debug!(
                "stream: {} bytes {}-{}/{}",
                name, span.start, span.end, size
            );
            file.seek(SeekFrom::Start(span.start))
                .await
                .map_err(|e| AppError::Internal(e.into()))?;
            Body::from_stream(ReaderStream::new(file.take(span.len())))
        }
    };

    Ok((status, AppendHeaders(resp_headers), body).into_response())
}

/// Same status and headers as the GET handler, without a body.
pub async fn head_media(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let (_, size) = state
        .store
        .open(&name)
        .await?
        .ok_or_else(|| AppError::NotFound(name.clone()))?;

    let span = requested_span(&headers, size)?;
    let (status, resp_headers) = response_meta(span.as_ref(), size);
    Ok((status, AppendHeaders(resp_headers)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_header_full_span() {
        assert_eq!(
            parse_range_header("bytes=0-1023", 2048),
            Some(RangeSpan {
                start: 0,
                end: 1023
            })
        );
        // surrounding whitespace is tolerated
        assert_eq!(
            parse_range_header(" bytes=10-19 ", 2048),
            Some(RangeSpan { start: 10, end: 19 })
        );
    }

    #[test]
    fn test_parse_range_header_open_ended() {
        assert_eq!(
            parse_range_header("bytes=500-", 1000),
            Some(RangeSpan {
                start: 500,
                end: 999
            })
        );
        assert_eq!(parse_range_header("bytes=0-", 1), Some(RangeSpan { start: 0, end: 0 }));
    }

    #[test]
    fn test_parse_range_header_clamps_end() {
        assert_eq!(
            parse_range_header("bytes=10-999999", 100),
            Some(RangeSpan { start: 10, end: 99 })
        );
    }

    #[test]
    fn test_parse_range_header_rejects_suffix_form() {
        assert_eq!(parse_range_header("bytes=-512", 2048), None);
    }

    #[test]
    fn test_parse_range_header_rejects_malformed() {
        assert_eq!(parse_range_header("bytes=abc-def", 100), None);
        assert_eq!(parse_range_header("chunks=0-10", 100), None);
        assert_eq!(parse_range_header("bytes=10", 100), None);
        assert_eq!(parse_range_header("bytes=0-1,5-9", 100), None);
        assert_eq!(parse_range_header("bytes=", 100), None);
    }

    #[test]
    fn test_parse_range_header_rejects_unsatisfiable() {
        assert_eq!(parse_range_header("bytes=100-", 100), None);
        assert_eq!(parse_range_header("bytes=5-2", 100), None);
        assert_eq!(parse_range_header("bytes=0-", 0), None);
    }

    #[test]
    fn test_response_meta_byte_accounting() {
        let span = RangeSpan { start: 500, end: 999 };
        assert_eq!(span.len(), 500);

        let (status, headers) = response_meta(Some(&span), 1000);
        assert_eq!(status, StatusCode::PARTIAL_CONTENT);
        assert!(headers.contains(&(header::CONTENT_LENGTH, "500".to_string())));
        assert!(headers.contains(&(header::CONTENT_RANGE, "bytes 500-999/1000".to_string())));

        let (status, headers) = response_meta(None, 1000);
        assert_eq!(status, StatusCode::OK);
        assert!(headers.contains(&(header::CONTENT_LENGTH, "1000".to_string())));
    }
}
