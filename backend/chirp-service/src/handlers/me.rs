/// Handlers for the authenticated author's own account
use crate::error::Result;
use crate::middleware::Viewer;
use crate::models::UpdateImageRequest;
use crate::services::AuthorService;
use actix_web::{web, HttpResponse};
use validator::Validate;

/// GET /api/v1/me
pub async fn get_me(authors: web::Data<AuthorService>, viewer: Viewer) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(authors.me(viewer.id).await?))
}

/// PUT /api/v1/me/image
pub async fn set_image(
    authors: web::Data<AuthorService>,
    viewer: Viewer,
    req: web::Json<UpdateImageRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    authors.ensure_author(&viewer).await?;
    authors
        .set_image(viewer.id, req.into_inner().image_url)
        .await?;
    Ok(HttpResponse::Ok().json(authors.me(viewer.id).await?))
}

/// GET /api/v1/me/export
pub async fn export(authors: web::Data<AuthorService>, viewer: Viewer) -> Result<HttpResponse> {
    let export = authors.export(viewer.id).await?;
    Ok(HttpResponse::Ok()
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", export_filename(&export.username)),
        ))
        .json(export))
}

/// Header-safe download name: anything outside `[A-Za-z0-9._-]` becomes `_`.
fn export_filename(username: &str) -> String {
    let stem: String = username
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}-export.json", stem)
}

/// DELETE /api/v1/me
pub async fn forget_me(authors: web::Data<AuthorService>, viewer: Viewer) -> Result<HttpResponse> {
    authors.forget_me(viewer.id).await?;
    tracing::info!(author_id = %viewer.id, username = %viewer.username, "Forget-me completed");
    Ok(HttpResponse::NoContent().finish())
}
