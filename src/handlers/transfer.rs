use crate::{
    errors::ServiceError,
    services::transfer::{
        ImportMode, ImportReport, WorkbookUpload, WORKBOOK_CONTENT_TYPE, WORKBOOK_FILE_NAME,
    },
    ApiResponse, AppState,
};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::str::FromStr;
use tracing::debug;

/// Downloads every sheet as one workbook
pub async fn export_workbook(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let workbook = state.services.transfer.export().await?;
    let disposition = format!("attachment; filename=\"{}\"", WORKBOOK_FILE_NAME);
    Ok((
        [
            (header::CONTENT_TYPE, WORKBOOK_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        workbook,
    )
        .into_response())
}

/// Imports one sheet from a multipart upload with the fields
/// `excel_file`, `sheet_name` and `import_mode`
pub async fn import_workbook(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ImportReport>>, ServiceError> {
    let upload = read_upload(multipart).await?;
    let report = state.services.transfer.import(upload).await?;
    let message = report.summary();
    Ok(Json(ApiResponse::with_message(report, message)))
}

async fn read_upload(mut multipart: Multipart) -> Result<WorkbookUpload, ServiceError> {
    let mut upload = WorkbookUpload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "excel_file" => {
                upload.file_name = field.file_name().map(str::to_string);
                upload.bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServiceError::BadRequest(e.body_text()))?
                    .to_vec();
            }
            "sheet_name" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServiceError::BadRequest(e.body_text()))?;
                upload.sheet_name = Some(text.trim().to_string()).filter(|s| !s.is_empty());
            }
            "import_mode" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServiceError::BadRequest(e.body_text()))?;
                upload.mode = parse_mode(&text)?;
            }
            other => debug!(field = other, "ignoring unknown upload field"),
        }
    }

    Ok(upload)
}

fn parse_mode(raw: &str) -> Result<ImportMode, ServiceError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(ImportMode::default());
    }
    ImportMode::from_str(raw).map_err(|_| {
        ServiceError::BadRequest(format!("Modo de importación no válido: '{}'.", raw))
    })
}

pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/export/excel", get(export_workbook))
        .route(
            "/export/import/excel",
            post(import_workbook).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_mode_means_overwrite() {
        assert_eq!(parse_mode("  ").unwrap(), ImportMode::Overwrite);
        assert_eq!(parse_mode("APPEND").unwrap(), ImportMode::Append);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = parse_mode("merge").unwrap_err();
        assert_eq!(
            err.response_message(),
            "Modo de importación no válido: 'merge'."
        );
    }
}
