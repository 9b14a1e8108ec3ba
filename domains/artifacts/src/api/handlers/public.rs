//! Public read access to stored artifacts

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use futures::Stream;
use stencil_common::Result;
use tokio::io::AsyncReadExt;

use crate::api::middleware::ArtifactsState;
use crate::domain::basename::SafeBasename;
use crate::error::StoreError;

const CHUNK_SIZE: usize = 64 * 1024;

/// Serve `{bucket}/{filename}` with a content type derived from the extension
///
/// The file is streamed in chunks rather than buffered.
pub async fn fetch_public(
    State(state): State<ArtifactsState>,
    Path((bucket, filename)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let content_type = SafeBasename::parse(&filename)?.content_type();
    let file = state.store.fetch_artifact(&bucket, &filename).await?;
    let size = file.metadata().await.map_err(StoreError::from)?.len();

    tracing::debug!(bucket = %bucket, file = %filename, size, "Serving artifact");

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_LENGTH, size.to_string()),
        ],
        Body::from_stream(chunks(file)),
    ))
}

fn chunks(file: tokio::fs::File) -> impl Stream<Item = std::io::Result<Vec<u8>>> + Send {
    futures::stream::try_unfold(file, |mut file| async move {
        let mut chunk = vec![0u8; CHUNK_SIZE];
        let read = file.read(&mut chunk).await?;
        if read == 0 {
            return Ok(None);
        }
        chunk.truncate(read);
        Ok(Some((chunk, file)))
    })
}
