mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use std::sync::Arc;

use application::auth_service::AuthService;
use application::post_service::PostService;
use application::search_service::SearchService;
use application::upload_service::UploadService;
use data::post_repository::PostgresPostRepository;
use data::user_repository::PostgresUserRepository;
use infrastructure::config::AppConfig;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::logging::init_logging;
use infrastructure::security::JwtKeys;
use presentation::utils::CookiePolicy;
use server::{Services, start_rest_server};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env()?;
    let keys = JwtKeys::new(&config.jwt_secret)?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let user_repo = Arc::new(PostgresUserRepository::new(pool.clone()));
    let post_repo = Arc::new(PostgresPostRepository::new(pool));

    let services = Services {
        auth: AuthService::new(user_repo, keys, config.allow_registration),
        posts: PostService::new(post_repo.clone()),
        search: SearchService::new(post_repo),
        uploads: UploadService::new(config.upload.clone()),
        cookies: CookiePolicy {
            secure: config.production,
        },
    };

    start_rest_server(config, services).await
}
