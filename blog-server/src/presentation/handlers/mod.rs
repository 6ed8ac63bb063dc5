pub mod auth;
pub mod health;
pub mod post;
pub mod upload;

use actix_web::web;

/// Mounts the whole JSON API under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health::health)
            .service(auth::scope())
            .service(post::list_posts)
            .service(post::search_posts)
            .service(post::get_post)
            .service(post::create_post)
            .service(post::update_post)
            .service(post::delete_post)
            .service(post::admin_posts)
            .service(upload::upload_file),
    );
}
