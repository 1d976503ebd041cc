use actix_multipart::{Multipart, MultipartError};
use actix_web::http::header::CONTENT_LENGTH;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use futures_util::StreamExt;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use crate::error::PredictError;
use crate::predict::classify_upload;
use crate::state::AppState;

/// Name of the multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

pub async fn predict(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, PredictError> {
    let span = tracing::info_span!("predict", request_id = %Uuid::new_v4());

    async move {
        let outcome = run(&req, state, payload).await;
        if let Err(err) = &outcome {
            if err.status_code().is_server_error() {
                error!(status = err.status_code().as_u16(), detail = %err.detail(), "prediction failed");
            } else {
                warn!(status = err.status_code().as_u16(), detail = %err.detail(), "rejected upload");
            }
        }
        outcome
    }
    .instrument(span)
    .await
}

async fn run(
    req: &HttpRequest,
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, PredictError> {
    let limit = state.max_content_length;
    if declared_length(req).map_or(false, |length| length > limit) {
        return Err(PredictError::PayloadTooLarge { limit });
    }

    let upload = read_upload(&mut payload, limit).await?;
    info!(
        filename = %secure_filename(&upload.filename),
        bytes = upload.bytes.len(),
        "received upload"
    );

    let Upload { bytes, .. } = upload;
    let response = web::block(move || classify_upload(&state, &bytes)).await??;

    Ok(HttpResponse::Ok().json(response))
}

fn declared_length(req: &HttpRequest) -> Option<usize> {
    req.headers()
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Find the first `file` part that carries a filename and buffer it.
async fn read_upload(payload: &mut Multipart, limit: usize) -> Result<Upload, PredictError> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(reject_body)?;

        let disposition = field.content_disposition();
        if disposition.get_name() != Some(FILE_FIELD) {
            continue;
        }
        // a part without a filename parameter is a plain form value
        let filename = match disposition.get_filename() {
            Some(filename) => filename.to_owned(),
            None => continue,
        };
        if filename.is_empty() {
            return Err(PredictError::EmptyFile);
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| PredictError::Multipart(e.to_string()))?;
            if bytes.len() + chunk.len() > limit {
                return Err(PredictError::PayloadTooLarge { limit });
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(Upload { filename, bytes });
    }

    debug!("no file part in request");
    Err(PredictError::MissingFile)
}

/// A body that is not multipart at all has no file part.
fn reject_body(err: MultipartError) -> PredictError {
    match err {
        MultipartError::NoContentType
        | MultipartError::ParseContentType
        | MultipartError::Boundary => PredictError::MissingFile,
        other => PredictError::Multipart(other.to_string()),
    }
}

/// Reduce a client supplied filename to a safe ASCII basename for logging.
pub fn secure_filename(filename: &str) -> String {
    let basename = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = basename
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}
