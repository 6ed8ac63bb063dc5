use actix_cors::Cors;
use actix_web::middleware::DefaultHeaders;
use actix_web::{App, HttpServer, web};
use tracing::info;

use crate::application::auth_service::AuthService;
use crate::application::post_service::PostService;
use crate::application::search_service::SearchService;
use crate::application::upload_service::UploadService;
use crate::domain::error::DomainError;
use crate::infrastructure::config::AppConfig;
use crate::presentation::handlers;
use crate::presentation::middleware::{AdminGuard, RequestTrace};
use crate::presentation::utils::CookiePolicy;

const JSON_LIMIT_BYTES: usize = 2 * 1024 * 1024;

/// Everything the handlers pull out of app data.
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub posts: PostService,
    pub search: SearchService,
    pub uploads: UploadService,
    pub cookies: CookiePolicy,
}

impl Services {
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.auth.clone()))
            .app_data(web::Data::new(self.posts.clone()))
            .app_data(web::Data::new(self.search.clone()))
            .app_data(web::Data::new(self.uploads.clone()))
            .app_data(web::Data::new(self.cookies))
            .app_data(
                web::JsonConfig::default()
                    .limit(JSON_LIMIT_BYTES)
                    .error_handler(|err, _| DomainError::validation(err.to_string()).into()),
            )
            .app_data(
                web::QueryConfig::default()
                    .error_handler(|err, _| DomainError::validation(err.to_string()).into()),
            )
            .configure(handlers::configure);
    }
}

pub async fn start_rest_server(config: AppConfig, services: Services) -> anyhow::Result<()> {
    let bind_address = (config.host.clone(), config.port);
    info!(host = %bind_address.0, port = bind_address.1, "HTTP server starting");

    let keys = services.auth.keys().clone();
    HttpServer::new(move || {
        App::new()
            .wrap(AdminGuard::new(keys.clone()))
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer"))
                    .add(("Permissions-Policy", "geolocation=()"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .wrap(build_cors(&config))
            .wrap(RequestTrace)
            .configure(|cfg| services.configure(cfg))
    })
    .bind(bind_address)?
    .run()
    .await?;

    Ok(())
}

/// With no configured origins only same-origin requests are allowed.
fn build_cors(config: &AppConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![actix_web::http::header::CONTENT_TYPE])
        .supports_credentials()
        .max_age(3600);

    for origin in &config.cors_origins {
        cors = cors.allowed_origin(origin);
    }

    cors
}
