/// Author handlers - registration, profiles and the follow graph
use crate::error::Result;
use crate::middleware::Viewer;
use crate::models::{NewAuthor, PageQuery};
use crate::services::{AuthorService, CheepService};
use actix_web::{web, HttpResponse};

/// POST /api/v1/authors
pub async fn register(
    authors: web::Data<AuthorService>,
    req: web::Json<NewAuthor>,
) -> Result<HttpResponse> {
    let author = authors.register(req.into_inner()).await?;
    Ok(HttpResponse::Created().json(author))
}

/// GET /api/v1/authors/{username}
pub async fn get_profile(
    authors: web::Data<AuthorService>,
    username: web::Path<String>,
    viewer: Option<Viewer>,
) -> Result<HttpResponse> {
    let profile = authors
        .profile(&username, viewer.map(|v| v.id))
        .await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// GET /api/v1/authors/{username}/cheeps
///
/// Authors looking at their own page see their private timeline.
pub async fn author_cheeps(
    cheeps: web::Data<CheepService>,
    username: web::Path<String>,
    viewer: Option<Viewer>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = cheeps
        .author_page(&username, query.page(), viewer.map(|v| v.id))
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /api/v1/authors/{username}/following
pub async fn following(
    authors: web::Data<AuthorService>,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(authors.following(&username).await?))
}

/// GET /api/v1/authors/{username}/followers
pub async fn followers(
    authors: web::Data<AuthorService>,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(authors.followers(&username).await?))
}

/// GET /api/v1/authors/{username}/follow
pub async fn follow_status(
    authors: web::Data<AuthorService>,
    username: web::Path<String>,
    viewer: Viewer,
) -> Result<HttpResponse> {
    let following = authors.is_following(viewer.id, &username).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "following": following })))
}

/// POST /api/v1/authors/{username}/follow
pub async fn follow(
    authors: web::Data<AuthorService>,
    username: web::Path<String>,
    viewer: Viewer,
) -> Result<HttpResponse> {
    authors.ensure_author(&viewer).await?;
    authors.follow(viewer.id, &username).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /api/v1/authors/{username}/follow
pub async fn unfollow(
    authors: web::Data<AuthorService>,
    username: web::Path<String>,
    viewer: Viewer,
) -> Result<HttpResponse> {
    authors.ensure_author(&viewer).await?;
    authors.unfollow(viewer.id, &username).await?;
    Ok(HttpResponse::NoContent().finish())
}
