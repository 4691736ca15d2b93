use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::models::Book;
use crate::state::AppState;
use actix_web::{get, post, web, HttpResponse};
use log::{info, warn};

#[post("/books")]
pub async fn add_book(
    CurrentUser(username): CurrentUser,
    book: web::Json<Book>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let book = book.into_inner();
    if !book.price.is_finite() || book.price < 0.0 {
        return Err(ApiError::Validation(
            "price must be a non-negative number".to_string(),
        ));
    }

    let id = book.id;
    match state.catalog.add(book).await {
        Ok(book) => {
            info!("{username} added book {id}");
            Ok(HttpResponse::Created().json(book))
        }
        Err(e) => {
            warn!("{username} tried to add duplicate book {id}");
            Err(e)
        }
    }
}

#[get("/books")]
pub async fn list_books(
    _user: CurrentUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.catalog.list().await))
}

#[get("/books/{book_id}")]
pub async fn get_book(
    _user: CurrentUser,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let book = state.catalog.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(book))
}
