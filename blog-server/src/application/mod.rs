pub mod auth_service;
pub mod post_service;
pub mod search_service;
pub mod upload_service;
