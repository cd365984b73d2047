// HTTP routes
use actix_web::{get, post, web, HttpRequest, HttpResponse, Error};
use actix_multipart::Multipart;

use crate::app_state::AppState;
use crate::service::{download_service, list_service, upload_service};

// Query strings are parsed inside the services, after authentication

#[get("/files")]
pub async fn files(req: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    list_service(req, app_state).await
}

#[post("/upload")]
pub async fn upload(
    payload: Multipart,
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    upload_service(payload, req, app_state).await
}

#[get("/download")]
pub async fn download(req: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    download_service(req, app_state).await
}

/// Register every route on an app or scope
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(files)
        .service(upload)
        .service(download);
}
