use actix_web::{get, post, web, HttpResponse};
use tracing::info;
use uuid::Uuid;

use super::member_group;
use crate::auth::CurrentUser;
use crate::balance::compute_balance_from_group;
use crate::error::ApiError;
use crate::exchange::get_exchanges_from_group;
use crate::schemas::{Group, GroupJson, GroupView, MemberJson, PublicUser};
use crate::state::AppState;

#[post("/groups")]
async fn add_group(
    state: web::Data<AppState>,
    user: CurrentUser,
    json: web::Json<GroupJson>,
) -> Result<HttpResponse, ApiError> {
    let body = json.into_inner();
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Group name can't be empty".into()));
    }

    let mut members = vec![user.0.clone()];
    for member in body.members {
        if members.contains(&member) {
            continue;
        }
        if state.store.find_user(&member).await?.is_none() {
            return Err(ApiError::BadRequest(format!("Unknown user {member}")));
        }
        members.push(member);
    }

    let group = Group {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        members,
        created_by: user.0,
    };
    state.store.insert_group(&group).await?;
    info!(group = %group.id, members = group.members.len(), "Group added");
    Ok(HttpResponse::Created().json(group))
}

#[get("/groups")]
async fn list_groups(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, ApiError> {
    let groups = state.store.groups_for_member(&user.0).await?;
    Ok(HttpResponse::Ok().json(groups))
}

#[get("/groups/{id}")]
async fn get_group(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let group = member_group(&state, &id, &user.0).await?;
    let mut member_details = Vec::with_capacity(group.members.len());
    for member in &group.members {
        if let Some(found) = state.store.find_user(member).await? {
            member_details.push(PublicUser::from(&found));
        }
    }
    Ok(HttpResponse::Ok().json(GroupView {
        group,
        member_details,
    }))
}

#[post("/groups/{id}/members")]
async fn add_member(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<String>,
    json: web::Json<MemberJson>,
) -> Result<HttpResponse, ApiError> {
    let group = member_group(&state, &id, &user.0).await?;
    let new_member = json.into_inner().user_id;
    if state.store.find_user(&new_member).await?.is_none() {
        return Err(ApiError::NotFound(format!("Couldn't find user {new_member}")));
    }
    let group = state
        .store
        .add_member(&group.id, &new_member)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Couldn't find group {}", group.id)))?;
    info!(group = %group.id, member = %new_member, "Member added");
    Ok(HttpResponse::Ok().json(group))
}

#[get("/groups/{id}/balance")]
async fn get_balance(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let group = member_group(&state, &id, &user.0).await?;
    let expenses = state.store.expenses_for_group(&group.id).await?;
    Ok(HttpResponse::Ok().json(compute_balance_from_group(&group, &expenses)))
}

#[get("/groups/{id}/exchanges")]
async fn get_exchanges(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let group = member_group(&state, &id, &user.0).await?;
    let expenses = state.store.expenses_for_group(&group.id).await?;
    Ok(HttpResponse::Ok().json(get_exchanges_from_group(&group, &expenses)))
}
