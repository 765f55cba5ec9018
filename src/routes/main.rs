use actix_web::http::StatusCode;
use actix_web::{Responder, get, post, web};
use actix_web_flash_messages::IncomingFlashMessages;
use tera::Tera;

use crate::forms::toolbar::{FavouritesForm, SearchForm};
use crate::routes::{SharedView, redirect, render_index};

#[get("/")]
pub async fn show_index(
    view: web::Data<SharedView>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let mut view = view.lock().await;
    render_index(&mut view, &tera, &flash_messages, StatusCode::OK).await
}

#[post("/search")]
pub async fn search(
    view: web::Data<SharedView>,
    web::Form(form): web::Form<SearchForm>,
) -> impl Responder {
    view.lock().await.set_search(&form.search);
    redirect("/")
}

#[post("/favourites")]
pub async fn favourites(
    view: web::Data<SharedView>,
    web::Form(form): web::Form<FavouritesForm>,
) -> impl Responder {
    view.lock().await.set_favorites_only(form.favorites_only);
    redirect("/")
}

#[post("/page/next")]
pub async fn next_page(view: web::Data<SharedView>) -> impl Responder {
    view.lock().await.next_page();
    redirect("/")
}

#[post("/page/prev")]
pub async fn prev_page(view: web::Data<SharedView>) -> impl Responder {
    view.lock().await.prev_page();
    redirect("/")
}

/// Manual retry after a failed load.
#[post("/refresh")]
pub async fn refresh(view: web::Data<SharedView>) -> impl Responder {
    view.lock().await.refetch();
    redirect("/")
}

#[post("/close")]
pub async fn close_dialog(view: web::Data<SharedView>) -> impl Responder {
    view.lock().await.close_dialog();
    redirect("/")
}
