/// Cheep handlers - timelines, cheeps and their comments
use crate::error::Result;
use crate::middleware::Viewer;
use crate::models::{CreateCheepRequest, CreateCommentRequest, PageQuery};
use crate::services::{AuthorService, CheepService, CommentService};
use actix_web::{web, HttpResponse};
use uuid::Uuid;

/// GET /api/v1/cheeps
pub async fn public_timeline(
    cheeps: web::Data<CheepService>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = cheeps.public_timeline(query.page()).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /api/v1/timeline
pub async fn private_timeline(
    cheeps: web::Data<CheepService>,
    viewer: Viewer,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = cheeps.private_timeline(viewer.id, query.page()).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// POST /api/v1/cheeps
pub async fn create_cheep(
    authors: web::Data<AuthorService>,
    cheeps: web::Data<CheepService>,
    viewer: Viewer,
    req: web::Json<CreateCheepRequest>,
) -> Result<HttpResponse> {
    let author = authors.ensure_author(&viewer).await?;
    let cheep = cheeps.post_cheep(author.id, &req.text).await?;
    Ok(HttpResponse::Created().json(cheep))
}

/// GET /api/v1/cheeps/{id}
pub async fn get_cheep(
    cheeps: web::Data<CheepService>,
    cheep_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let detail = cheeps.cheep_detail(*cheep_id).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// DELETE /api/v1/cheeps/{id}
pub async fn delete_cheep(
    cheeps: web::Data<CheepService>,
    cheep_id: web::Path<Uuid>,
    viewer: Viewer,
) -> Result<HttpResponse> {
    if cheeps.delete_cheep(*cheep_id, viewer.id).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Ok(HttpResponse::NotFound().finish())
    }
}

/// POST /api/v1/cheeps/{id}/comments
pub async fn create_comment(
    authors: web::Data<AuthorService>,
    comments: web::Data<CommentService>,
    cheep_id: web::Path<Uuid>,
    viewer: Viewer,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let author = authors.ensure_author(&viewer).await?;
    let comment = comments
        .add_comment(*cheep_id, author.id, &req.text)
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

/// GET /api/v1/cheeps/{id}/comments
pub async fn list_comments(
    comments: web::Data<CommentService>,
    cheep_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(comments.comments(*cheep_id).await?))
}

/// DELETE /api/v1/comments/{id}
pub async fn delete_comment(
    comments: web::Data<CommentService>,
    comment_id: web::Path<Uuid>,
    viewer: Viewer,
) -> Result<HttpResponse> {
    if comments.delete_comment(*comment_id, viewer.id).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Ok(HttpResponse::NotFound().finish())
    }
}
