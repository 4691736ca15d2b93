use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::models::{LoginRequest, LoginResponse, MessageResponse};
use crate::state::AppState;
use actix_web::{get, post, web, HttpResponse};
use log::{info, warn};

#[post("/token")]
pub async fn login(
    form: web::Form<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let LoginRequest { username, password } = form.into_inner();

    let ctx = state.clone();
    let name = username.clone();
    let user = web::block(move || ctx.users.authenticate(&name, &password))
        .await
        .map_err(|e| ApiError::Internal(format!("password check failed: {e}")))?;

    let Some(user) = user else {
        warn!("Failed login for {username:?}");
        return Err(ApiError::InvalidCredentials);
    };

    let token = state.tokens.issue(&user)?;
    info!("Issued token for {}", user.username);
    Ok(HttpResponse::Ok().json(LoginResponse::bearer(token)))
}

#[get("/protected")]
pub async fn protected(CurrentUser(username): CurrentUser) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: format!("Hello, {username}. You have access!"),
    }))
}
