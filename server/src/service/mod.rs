//service/mod.rs
pub mod blob_service;

use actix_web::{web, HttpResponse, Error, HttpRequest};
use actix_web::error::{ErrorBadRequest, ErrorPayloadTooLarge};
use actix_web::http::header::{self, ContentDisposition, DispositionParam, DispositionType};
use actix_multipart::Multipart;
use bytes::BytesMut;
use futures::TryStreamExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::auth::authenticate_request;
use crate::naming::CONTENT_TYPE;
use crate::service::blob_service::FileEntry;

/// Multipart field carrying the uploaded content
pub const FILE_FIELD: &str = "file";

/// File name suggested to clients on download
pub const DOWNLOAD_FILE_NAME: &str = "downloaded_data.json";

/// Body of a `/files` response
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub files: Vec<FileEntry>,
}

/// Body of an `/upload` response
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub data_key: String,
}

/// Query string of `/upload`
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    pub input_type: Option<String>,
}

/// Query string of `/download`
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub data_key: Option<String>,
}

/// Content of the `file` multipart field
struct UploadedFile {
    file_name: Option<String>,
    bytes: BytesMut,
}

/// Pull the `file` field out of a multipart body, draining every other field
async fn read_file_field(mut payload: Multipart, max_upload_size: u64) -> Result<UploadedFile, Error> {
    let mut upload: Option<UploadedFile> = None;

    while let Some(mut field) = payload.try_next().await? {
        let field_name = field.name().map(str::to_string);
        if field_name.as_deref() != Some(FILE_FIELD) || upload.is_some() {
            debug!("Skipping multipart field {:?}", field_name);
            while field.try_next().await?.is_some() {}
            continue;
        }

        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let mut bytes = BytesMut::new();
        while let Some(chunk) = field.try_next().await? {
            if (bytes.len() + chunk.len()) as u64 > max_upload_size {
                warn!("Upload exceeds the {} byte limit", max_upload_size);
                return Err(ErrorPayloadTooLarge(format!(
                    "Upload exceeds the maximum size of {} bytes",
                    max_upload_size
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        upload = Some(UploadedFile { file_name, bytes });
    }

    upload.ok_or_else(|| ErrorBadRequest(format!("Missing multipart field '{}'", FILE_FIELD)))
}

pub async fn list_service(req: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    authenticate_request(&req, &app_state.config.auth)?;

    let files = app_state.blob_service.list()?;
    info!("Listing {} files", files.len());

    Ok(HttpResponse::Ok().json(ListResponse { files }))
}

pub async fn upload_service(
    payload: Multipart,
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    authenticate_request(&req, &app_state.config.auth)?;

    // Accepted for client compatibility only, a malformed value is not an error
    let query = web::Query::<UploadQuery>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .unwrap_or_default();
    if let Some(input_type) = query.input_type {
        debug!("Ignoring input_type={}", input_type);
    }

    let upload = read_file_field(payload, app_state.config.server.max_upload_size).await?;
    info!("Received upload of {} bytes (file name {:?})", upload.bytes.len(), upload.file_name);

    let record = app_state.blob_service.upload(upload.file_name.as_deref(), &upload.bytes)?;
    let _mdc = log_mdc::insert_scoped("data_key", record.data_key.as_str());
    info!("Upload stored as {}", record.file_name);

    Ok(HttpResponse::Ok().json(UploadResponse { data_key: record.data_key }))
}

pub async fn download_service(req: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    authenticate_request(&req, &app_state.config.auth)?;

    let query = web::Query::<DownloadQuery>::from_query(req.query_string())?;
    let data_key = query.into_inner().data_key.ok_or_else(|| ErrorBadRequest("Missing query parameter 'data_key'"))?;
    let _mdc = log_mdc::insert_scoped("data_key", data_key.as_str());

    let (resolved, data) = app_state.blob_service.download(&data_key)?;

    let mut response = HttpResponse::Ok();
    response
        .content_type(CONTENT_TYPE)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(DOWNLOAD_FILE_NAME.to_string())],
        });
    if let Some(record) = &resolved.record {
        response.insert_header((header::ETAG, format!("\"{}\"", record.checksum)));
    }

    Ok(response.body(data))
}
