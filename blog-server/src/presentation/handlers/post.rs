use actix_web::{HttpRequest, HttpResponse, delete, get, put, routes, web};
use tracing::info;

use crate::application::auth_service::AuthService;
use crate::application::post_service::{CreatePostInput, PostService};
use crate::application::search_service::SearchService;
use crate::domain::error::DomainError;
use crate::domain::post::Author;
use crate::presentation::dto::{
    CreatePostRequest, ListPostsQuery, MessageResponse, PostResponse, SearchQuery,
    UpdatePostRequest,
};
use crate::presentation::utils::{AdminUser, request_id};

#[get("/posts")]
pub async fn list_posts(
    posts: web::Data<PostService>,
    query: web::Query<ListPostsQuery>,
) -> Result<HttpResponse, DomainError> {
    let page = posts.list(query.pagination(), false).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/posts/search")]
pub async fn search_posts(
    req: HttpRequest,
    search: web::Data<SearchService>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, DomainError> {
    let page = search.search(query.into_inner().into()).await?;

    info!(
        request_id = %request_id(&req),
        total = page.pagination.total,
        "search served"
    );

    Ok(HttpResponse::Ok().json(page))
}

#[get("/posts/{slug}")]
pub async fn get_post(
    posts: web::Data<PostService>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let post = posts.get_by_slug(&path).await?;
    Ok(HttpResponse::Ok().json(PostResponse { post }))
}

#[routes]
#[post("/posts")]
#[post("/posts/create")]
pub async fn create_post(
    req: HttpRequest,
    admin: AdminUser,
    posts: web::Data<PostService>,
    auth: web::Data<AuthService>,
    payload: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, DomainError> {
    let author = auth.find_user(admin.0.sub).await?.map(|user| Author {
        id: user.id,
        name: user.name,
    });
    let input = CreatePostInput {
        author,
        ..CreatePostInput::from(payload.into_inner())
    };
    let post = posts.create(input).await?;

    info!(
        request_id = %request_id(&req),
        user_id = %admin.0.sub,
        slug = %post.slug,
        "post created"
    );

    Ok(HttpResponse::Created().json(PostResponse { post }))
}

#[put("/posts/{slug}")]
pub async fn update_post(
    req: HttpRequest,
    admin: AdminUser,
    posts: web::Data<PostService>,
    path: web::Path<String>,
    payload: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse, DomainError> {
    let post = posts
        .update(&path, &payload.title, &payload.content)
        .await?;

    info!(
        request_id = %request_id(&req),
        user_id = %admin.0.sub,
        slug = %post.slug,
        "post updated"
    );

    Ok(HttpResponse::Ok().json(PostResponse { post }))
}

#[delete("/posts/{slug}")]
pub async fn delete_post(
    req: HttpRequest,
    admin: AdminUser,
    posts: web::Data<PostService>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    posts.delete(&path).await?;

    info!(
        request_id = %request_id(&req),
        user_id = %admin.0.sub,
        slug = %path.as_str(),
        "post deleted"
    );

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Post deleted successfully",
    }))
}

/// Dashboard listing, drafts included.
#[get("/admin/posts")]
pub async fn admin_posts(
    _admin: AdminUser,
    posts: web::Data<PostService>,
    query: web::Query<ListPostsQuery>,
) -> Result<HttpResponse, DomainError> {
    let page = posts.list(query.pagination(), true).await?;
    Ok(HttpResponse::Ok().json(page))
}
