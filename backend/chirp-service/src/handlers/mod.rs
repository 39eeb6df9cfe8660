/// HTTP handlers for chirp-service
///
/// - Cheeps: timelines, posting, detail and deletion, plus comments under a cheep
/// - Authors: registration, profiles and follow/unfollow
/// - Me: the authenticated author's profile, image, data export and account removal
pub mod authors;
pub mod cheeps;
pub mod health;
pub mod me;

pub use health::HealthState;

use crate::middleware::{JwtAuthMiddleware, MetricsMiddleware};
use actix_web::web;

/// Register every route. Service state must already be attached as app data.
pub fn configure(cfg: &mut web::ServiceConfig, jwt_secret: &str) {
    cfg.route("/metrics", web::get().to(crate::metrics::serve_metrics))
        .route("/api/v1/health", web::get().to(health::health_summary))
        .route("/api/v1/health/ready", web::get().to(health::readiness))
        .route("/api/v1/health/live", web::get().to(health::liveness))
        .service(
            web::scope("/api/v1")
                .wrap(JwtAuthMiddleware::new(jwt_secret))
                .wrap(MetricsMiddleware)
                .service(
                    web::scope("/cheeps")
                        .service(
                            web::resource("")
                                .route(web::get().to(cheeps::public_timeline))
                                .route(web::post().to(cheeps::create_cheep)),
                        )
                        .service(
                            web::resource("/{cheep_id}")
                                .route(web::get().to(cheeps::get_cheep))
                                .route(web::delete().to(cheeps::delete_cheep)),
                        )
                        .service(
                            web::resource("/{cheep_id}/comments")
                                .route(web::get().to(cheeps::list_comments))
                                .route(web::post().to(cheeps::create_comment)),
                        ),
                )
                .route(
                    "/comments/{comment_id}",
                    web::delete().to(cheeps::delete_comment),
                )
                .route("/timeline", web::get().to(cheeps::private_timeline))
                .service(
                    web::scope("/authors")
                        .service(web::resource("").route(web::post().to(authors::register)))
                        .service(
                            web::resource("/{username}").route(web::get().to(authors::get_profile)),
                        )
                        .route("/{username}/cheeps", web::get().to(authors::author_cheeps))
                        .route("/{username}/following", web::get().to(authors::following))
                        .route("/{username}/followers", web::get().to(authors::followers))
                        .service(
                            web::resource("/{username}/follow")
                                .route(web::get().to(authors::follow_status))
                                .route(web::post().to(authors::follow))
                                .route(web::delete().to(authors::unfollow)),
                        ),
                )
                .service(
                    web::scope("/me")
                        .service(
                            web::resource("")
                                .route(web::get().to(me::get_me))
                                .route(web::delete().to(me::forget_me)),
                        )
                        .route("/image", web::put().to(me::set_image))
                        .route("/export", web::get().to(me::export)),
                ),
        );
}
