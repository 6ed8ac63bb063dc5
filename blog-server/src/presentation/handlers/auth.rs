use actix_web::{HttpRequest, HttpResponse, Scope, get, post, web};
use tracing::info;

use crate::application::auth_service::AuthService;
use crate::domain::error::DomainError;
use crate::presentation::dto::{
    LoginRequest, LoginResponse, MessageResponse, RegisterRequest, RegisterResponse, UserResponse,
};
use crate::presentation::utils::{AuthenticatedUser, CookiePolicy, request_id};

pub fn scope() -> Scope {
    web::scope("/auth")
        .service(register)
        .service(login)
        .service(logout)
        .service(me)
}

#[post("/register")]
async fn register(
    req: HttpRequest,
    auth: web::Data<AuthService>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, DomainError> {
    let user = auth
        .register(&payload.email, &payload.password, &payload.name)
        .await?;

    info!(request_id = %request_id(&req), user_id = %user.id, "registration accepted");

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "User created successfully",
        user,
    }))
}

#[post("/login")]
async fn login(
    req: HttpRequest,
    auth: web::Data<AuthService>,
    cookies: web::Data<CookiePolicy>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, DomainError> {
    let session = auth.login(&payload.email, &payload.password).await?;

    info!(request_id = %request_id(&req), user_id = %session.user.id, "session issued");

    Ok(HttpResponse::Ok()
        .cookie(cookies.session(session.token))
        .json(LoginResponse {
            success: true,
            message: "Login successful",
            user: session.user,
        }))
}

/// Only clears the cookie: issued tokens stay valid until they expire.
#[post("/logout")]
async fn logout(cookies: web::Data<CookiePolicy>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(cookies.removal())
        .json(MessageResponse {
            message: "Logged out",
        })
}

#[get("/me")]
async fn me(
    auth: web::Data<AuthService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, DomainError> {
    let user = auth.current_user(&user.0).await?;
    Ok(HttpResponse::Ok().json(UserResponse { user }))
}
