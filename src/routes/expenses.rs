use std::collections::HashSet;

use actix_web::{delete, get, post, web, HttpResponse};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::member_group;
use crate::auth::CurrentUser;
use crate::balance::compute_balance;
use crate::error::ApiError;
use crate::schemas::{Expense, ExpenseJson, ExpenseView, ExpensesQuery, Group};
use crate::state::AppState;

fn validate_expense(body: &ExpenseJson, group: &Group) -> Result<(), ApiError> {
    if body.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title can't be empty".into()));
    }
    if !body.amount.is_finite() || body.amount <= 0.0 {
        return Err(ApiError::BadRequest("Amount must be positive".into()));
    }
    if !group.is_member(&body.paid_by) {
        return Err(ApiError::BadRequest(format!(
            "{} is not a member of this group",
            body.paid_by
        )));
    }
    let mut seen = HashSet::new();
    for split in &body.split_among {
        if !split.amount.is_finite() || split.amount < 0.0 {
            return Err(ApiError::BadRequest(format!(
                "Invalid share for {}",
                split.user
            )));
        }
        if !group.is_member(&split.user) {
            return Err(ApiError::BadRequest(format!(
                "{} is not a member of this group",
                split.user
            )));
        }
        if !seen.insert(split.user.as_str()) {
            return Err(ApiError::BadRequest(format!(
                "{} appears more than once in the split",
                split.user
            )));
        }
    }
    Ok(())
}

#[post("/expenses")]
async fn add_expense(
    state: web::Data<AppState>,
    user: CurrentUser,
    json: web::Json<ExpenseJson>,
) -> Result<HttpResponse, ApiError> {
    let body = json.into_inner();
    let group = member_group(&state, &body.group, &user.0).await?;
    validate_expense(&body, &group)?;

    let expense = Expense {
        id: Uuid::new_v4().to_string(),
        title: body.title.trim().to_string(),
        amount: body.amount,
        description: body.description,
        paid_by: body.paid_by,
        group: group.id,
        split_among: body.split_among,
        date: body.date.unwrap_or_else(Utc::now),
    };
    state.store.insert_expense(&expense).await?;
    info!(expense = %expense.id, group = %expense.group, "Expense added");
    Ok(HttpResponse::Created().json(expense))
}

#[get("/expenses")]
async fn list_expenses(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<ExpensesQuery>,
) -> Result<HttpResponse, ApiError> {
    let group = member_group(&state, &query.group_id, &user.0).await?;
    let expenses: Vec<ExpenseView> = state
        .store
        .expenses_for_group(&group.id)
        .await?
        .into_iter()
        .map(|expense| ExpenseView {
            balance_for_current_user: compute_balance(&expense, &user.0),
            expense,
        })
        .collect();
    Ok(HttpResponse::Ok().json(expenses))
}

#[delete("/expenses/{id}")]
async fn delete_expense(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let expense = state
        .store
        .find_expense(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Couldn't find expense {id}")))?;
    member_group(&state, &expense.group, &user.0).await?;
    state.store.delete_expense(&expense.id).await?;
    info!(expense = %expense.id, "Expense deleted");
    Ok(HttpResponse::NoContent().finish())
}
