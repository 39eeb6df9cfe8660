/// Chirp Service Library
///
/// A microblogging backend: authors post short cheeps, comment on them and
/// follow each other. Timelines are paginated newest first.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route table
/// - `models`: Entities, request bodies and response DTOs
/// - `services`: Business logic layer
/// - `repository`: Storage traits with PostgreSQL and in-memory implementations
/// - `middleware`: Bearer token authentication and request metrics
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

use actix_web::web;
use handlers::HealthState;
use repository::ChirpRepository;
use services::{AuthorService, CheepService, CommentService};
use std::sync::Arc;

/// Shared application state, built once and cloned into every worker.
#[derive(Clone)]
pub struct AppState {
    pub authors: web::Data<AuthorService>,
    pub cheeps: web::Data<CheepService>,
    pub comments: web::Data<CommentService>,
    health: web::Data<HealthState>,
    jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn ChirpRepository>,
        storage: &'static str,
        page_size: u32,
        jwt_secret: &str,
    ) -> Self {
        Self {
            authors: web::Data::new(AuthorService::new(repo.clone())),
            cheeps: web::Data::new(CheepService::new(repo.clone(), page_size)),
            comments: web::Data::new(CommentService::new(repo.clone())),
            health: web::Data::new(HealthState::new(repo, storage)),
            jwt_secret: Arc::from(jwt_secret),
        }
    }

    /// Attach the services and register all routes.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.authors.clone())
            .app_data(self.cheeps.clone())
            .app_data(self.comments.clone())
            .app_data(self.health.clone());
        handlers::configure(cfg, &self.jwt_secret);
    }
}
