use actix_web::{get, web, HttpResponse};

use crate::error::ApiError;
use crate::schemas::Group;
use crate::state::AppState;

mod expenses;
mod groups;
mod users;

fn bad_request(message: String) -> actix_web::Error {
    ApiError::BadRequest(message).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    // Extractor failures get the same JSON error body as the handlers
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| bad_request(err.to_string())))
        .app_data(web::QueryConfig::default().error_handler(|err, _| bad_request(err.to_string())))
        .app_data(web::PathConfig::default().error_handler(|err, _| bad_request(err.to_string())));

    cfg.service(health)
        .service(users::register)
        .service(users::login)
        .service(users::logout)
        .service(users::me)
        .service(users::list_users)
        .service(groups::add_group)
        .service(groups::list_groups)
        .service(groups::get_group)
        .service(groups::add_member)
        .service(groups::get_balance)
        .service(groups::get_exchanges)
        .service(expenses::add_expense)
        .service(expenses::list_expenses)
        .service(expenses::delete_expense);
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

/// Loads a group the requesting user belongs to.
async fn member_group(state: &AppState, id: &str, user: &str) -> Result<Group, ApiError> {
    let group = state
        .store
        .find_group(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Couldn't find group {id}")))?;
    if !group.is_member(user) {
        return Err(ApiError::NotAMember(id.to_string()));
    }
    Ok(group)
}
