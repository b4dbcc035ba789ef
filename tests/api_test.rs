use std::sync::Arc;

use actix_web::{cookie::Cookie, http::StatusCode, test, web, App};
use chrono::Duration;
use serde_json::{json, Value};
use splitledger::{
    auth::{SessionKeys, SESSION_COOKIE},
    routes,
    schemas::{Group, PublicUser},
    state::AppState,
    store::MemoryStore,
};

fn state() -> web::Data<AppState> {
    web::Data::new(AppState::new(
        Arc::new(MemoryStore::new()),
        SessionKeys::new("integration-test-secret", Duration::hours(1)),
    ))
}

macro_rules! app {
    () => {
        test::init_service(
            App::new()
                .app_data(state())
                .configure(routes::configure),
        )
        .await
    };
}

/// Registers a user and returns it together with its session cookie.
macro_rules! register {
    ($app:expr, $name:expr) => {{
        let request = test::TestRequest::post()
            .uri("/users/register")
            .set_json(json!({
                "name": $name,
                "email": format!("{}@example.com", $name),
                "password": "correct horse",
            }))
            .to_request();
        let response = test::call_service(&$app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let cookie: Cookie<'static> = response
            .response()
            .cookies()
            .find(|cookie| cookie.name() == SESSION_COOKIE)
            .expect("session cookie")
            .into_owned();
        let user: PublicUser = test::read_body_json(response).await;
        (user, cookie)
    }};
}

macro_rules! create_group {
    ($app:expr, $cookie:expr, $members:expr) => {{
        let request = test::TestRequest::post()
            .uri("/groups")
            .cookie($cookie.clone())
            .set_json(json!({ "name": "Lisbon trip", "members": $members }))
            .to_request();
        let response = test::call_service(&$app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let group: Group = test::read_body_json(response).await;
        group
    }};
}

macro_rules! add_expense {
    ($app:expr, $cookie:expr, $body:expr) => {{
        let request = test::TestRequest::post()
            .uri("/expenses")
            .cookie($cookie.clone())
            .set_json($body)
            .to_request();
        test::call_service(&$app, request).await
    }};
}

macro_rules! get {
    ($app:expr, $cookie:expr, $uri:expr) => {{
        let request = test::TestRequest::get()
            .uri(&$uri)
            .cookie($cookie.clone())
            .to_request();
        test::call_service(&$app, request).await
    }};
}

#[actix_web::test]
async fn test_health() {
    let app = app!();
    let request = test::TestRequest::get().uri("/health").to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_register_login_and_me() {
    let app = app!();
    let (ana, cookie) = register!(app, "ana");
    assert_eq!(ana.email, "ana@example.com");

    let response = get!(app, cookie, "/users/me".to_string());
    assert_eq!(response.status(), StatusCode::OK);
    let me: PublicUser = test::read_body_json(response).await;
    assert_eq!(me, ana);

    // Same email, different case
    let request = test::TestRequest::post()
        .uri("/users/register")
        .set_json(json!({ "name": "Ana", "email": "ANA@example.com", "password": "whatever" }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let request = test::TestRequest::post()
        .uri("/users/login")
        .set_json(json!({ "email": "ana@example.com", "password": "wrong horse" }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = test::TestRequest::post()
        .uri("/users/login")
        .set_json(json!({ "email": " Ana@Example.com ", "password": "correct horse" }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .response()
        .cookies()
        .any(|cookie| cookie.name() == SESSION_COOKIE));
}

#[actix_web::test]
async fn test_register_validation() {
    let app = app!();
    for body in [
        json!({ "name": "", "email": "a@example.com", "password": "secret1" }),
        json!({ "name": "ana", "email": "not-an-email", "password": "secret1" }),
        json!({ "name": "ana", "email": "a@example.com", "password": "short" }),
    ] {
        let request = test::TestRequest::post()
            .uri("/users/register")
            .set_json(body)
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: Value = test::read_body_json(response).await;
        assert!(error["error"].is_string());
    }
}

#[actix_web::test]
async fn test_requests_without_session_are_rejected() {
    let app = app!();
    let request = test::TestRequest::get().uri("/groups").to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = test::TestRequest::get()
        .uri("/users/me")
        .cookie(Cookie::new(SESSION_COOKIE, "someone.9999999999.00"))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_bearer_token_is_accepted() {
    let app = app!();
    let (ana, cookie) = register!(app, "ana");
    let request = test::TestRequest::get()
        .uri("/users/me")
        .insert_header(("Authorization", format!("Bearer {}", cookie.value())))
        .to_request();
    let me: PublicUser = test::call_and_read_body_json(&app, request).await;
    assert_eq!(me.id, ana.id);
}

#[actix_web::test]
async fn test_expense_listing_carries_balance_for_current_user() {
    let app = app!();
    let (ana, ana_cookie) = register!(app, "ana");
    let (bob, bob_cookie) = register!(app, "bob");
    let group = create_group!(app, ana_cookie, vec![bob.id.clone()]);
    assert_eq!(group.members, vec![ana.id.clone(), bob.id.clone()]);

    let response = add_expense!(
        app,
        ana_cookie,
        json!({
            "title": "Hotel",
            "amount": 100.0,
            "paidBy": ana.id,
            "group": group.id,
            "splitAmong": [{ "user": ana.id, "amount": 30.0 }, { "user": bob.id, "amount": 70.0 }],
            "date": "2024-05-01T10:00:00Z",
        })
    );
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = add_expense!(
        app,
        bob_cookie,
        json!({
            "title": "Dinner",
            "amount": 50.0,
            "description": "Seafood place",
            "paidBy": bob.id,
            "group": group.id,
            "splitAmong": [{ "user": ana.id, "amount": 25.0 }, { "user": bob.id, "amount": 25.0 }],
            "date": "2024-05-02T20:00:00Z",
        })
    );
    assert_eq!(response.status(), StatusCode::CREATED);

    let uri = format!("/expenses?groupId={}", group.id);
    let response = get!(app, ana_cookie, uri);
    assert_eq!(response.status(), StatusCode::OK);
    let expenses: Vec<Value> = test::read_body_json(response).await;
    assert_eq!(expenses.len(), 2);
    assert_eq!(expenses[0]["title"], "Dinner");
    assert_eq!(expenses[0]["description"], "Seafood place");
    assert_eq!(
        expenses[0]["balanceForCurrentUser"],
        json!({ "amount": 25.0, "type": "borrowed" })
    );
    assert_eq!(expenses[1]["title"], "Hotel");
    assert_eq!(
        expenses[1]["balanceForCurrentUser"],
        json!({ "amount": 70.0, "type": "lent" })
    );

    let expenses: Vec<Value> = test::read_body_json(get!(app, bob_cookie, uri)).await;
    assert_eq!(
        expenses[0]["balanceForCurrentUser"],
        json!({ "amount": 25.0, "type": "lent" })
    );
    assert_eq!(
        expenses[1]["balanceForCurrentUser"],
        json!({ "amount": 70.0, "type": "borrowed" })
    );

    let balance: Value =
        test::read_body_json(get!(app, ana_cookie, format!("/groups/{}/balance", group.id)))
            .await;
    assert_eq!(balance[&ana.id], 45.0);
    assert_eq!(balance[&bob.id], -45.0);

    let exchanges: Value = test::read_body_json(get!(
        app,
        ana_cookie,
        format!("/groups/{}/exchanges", group.id)
    ))
    .await;
    assert_eq!(
        exchanges,
        json!([{ "payer": bob.id, "receiver": ana.id, "amount": 45.0 }])
    );
}

#[actix_web::test]
async fn test_expense_with_no_share_for_viewer() {
    let app = app!();
    let (ana, ana_cookie) = register!(app, "ana");
    let (bob, _) = register!(app, "bob");
    let (carl, carl_cookie) = register!(app, "carl");
    let group = create_group!(app, ana_cookie, vec![bob.id.clone(), carl.id.clone()]);

    let response = add_expense!(
        app,
        ana_cookie,
        json!({
            "title": "Taxi",
            "amount": 20.0,
            "paidBy": ana.id,
            "group": group.id,
            "splitAmong": [{ "user": bob.id, "amount": 20.0 }],
        })
    );
    assert_eq!(response.status(), StatusCode::CREATED);

    let uri = format!("/expenses?groupId={}", group.id);
    let expenses: Vec<Value> = test::read_body_json(get!(app, carl_cookie, uri)).await;
    assert_eq!(
        expenses[0]["balanceForCurrentUser"],
        json!({ "amount": 0.0, "type": "lent" })
    );
}

#[actix_web::test]
async fn test_expense_validation() {
    let app = app!();
    let (ana, ana_cookie) = register!(app, "ana");
    let (carl, _) = register!(app, "carl");
    let group = create_group!(app, ana_cookie, Vec::<String>::new());

    let response = add_expense!(
        app,
        ana_cookie,
        json!({ "title": "Free", "amount": 0.0, "paidBy": ana.id, "group": group.id })
    );
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = add_expense!(
        app,
        ana_cookie,
        json!({ "title": "Gift", "amount": 10.0, "paidBy": carl.id, "group": group.id })
    );
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = add_expense!(
        app,
        ana_cookie,
        json!({ "title": "Lost", "amount": 10.0, "paidBy": ana.id, "group": "nope" })
    );
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_non_members_are_forbidden() {
    let app = app!();
    let (ana, ana_cookie) = register!(app, "ana");
    let (_, carl_cookie) = register!(app, "carl");
    let group = create_group!(app, ana_cookie, Vec::<String>::new());

    let response = add_expense!(
        app,
        ana_cookie,
        json!({
            "title": "Groceries",
            "amount": 42.0,
            "paidBy": ana.id,
            "group": group.id,
            "splitAmong": [{ "user": ana.id, "amount": 42.0 }],
        })
    );
    let expense: Value = test::read_body_json(response).await;

    for uri in [
        format!("/groups/{}", group.id),
        format!("/groups/{}/balance", group.id),
        format!("/expenses?groupId={}", group.id),
    ] {
        let response = get!(app, carl_cookie, uri);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    let response = add_expense!(
        app,
        carl_cookie,
        json!({ "title": "Sneaky", "amount": 1.0, "paidBy": ana.id, "group": group.id })
    );
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let delete_uri = format!("/expenses/{}", expense["id"].as_str().unwrap());
    let request = test::TestRequest::delete()
        .uri(&delete_uri)
        .cookie(carl_cookie.clone())
        .to_request();
    assert_eq!(
        test::call_service(&app, request).await.status(),
        StatusCode::FORBIDDEN
    );

    let request = test::TestRequest::delete()
        .uri(&delete_uri)
        .cookie(ana_cookie.clone())
        .to_request();
    assert_eq!(
        test::call_service(&app, request).await.status(),
        StatusCode::NO_CONTENT
    );

    let expenses: Vec<Value> = test::read_body_json(get!(
        app,
        ana_cookie,
        format!("/expenses?groupId={}", group.id)
    ))
    .await;
    assert!(expenses.is_empty());
}

#[actix_web::test]
async fn test_group_membership() {
    let app = app!();
    let (ana, ana_cookie) = register!(app, "ana");
    let (carl, carl_cookie) = register!(app, "carl");
    let group = create_group!(app, ana_cookie, Vec::<String>::new());

    let request = test::TestRequest::post()
        .uri("/groups")
        .cookie(ana_cookie.clone())
        .set_json(json!({ "name": "Ghosts", "members": ["no-such-user"] }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = test::TestRequest::post()
        .uri(&format!("/groups/{}/members", group.id))
        .cookie(ana_cookie.clone())
        .set_json(json!({ "userId": "no-such-user" }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let request = test::TestRequest::post()
        .uri(&format!("/groups/{}/members", group.id))
        .cookie(ana_cookie.clone())
        .set_json(json!({ "userId": carl.id }))
        .to_request();
    let updated: Group = test::call_and_read_body_json(&app, request).await;
    assert_eq!(updated.members, vec![ana.id.clone(), carl.id.clone()]);

    let groups: Vec<Group> = test::read_body_json(get!(app, carl_cookie, "/groups".to_string())).await;
    assert_eq!(groups.len(), 1);

    let details: Value = test::read_body_json(get!(
        app,
        carl_cookie,
        format!("/groups/{}", group.id)
    ))
    .await;
    assert_eq!(details["memberDetails"].as_array().map(Vec::len), Some(2));
    assert_eq!(details["createdBy"], json!(ana.id));
}

#[actix_web::test]
async fn test_malformed_requests_get_json_errors() {
    let app = app!();
    let request = test::TestRequest::post()
        .uri("/users/register")
        .set_json(json!({ "name": "ana" }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: Value = test::read_body_json(response).await;
    assert!(error["error"].as_str().unwrap().contains("email"));

    let (_, cookie) = register!(app, "ana");
    let response = get!(app, cookie, "/expenses".to_string());
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: Value = test::read_body_json(response).await;
    assert!(error["error"].is_string());

    let response = add_expense!(app, cookie, json!({ "title": "Half", "amount": "ten" }));
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: Value = test::read_body_json(response).await;
    assert!(error["error"].is_string());
}

#[actix_web::test]
async fn test_logout_expires_session_cookie() {
    let app = app!();
    let (_, cookie) = register!(app, "ana");
    let request = test::TestRequest::post()
        .uri("/users/logout")
        .cookie(cookie.clone())
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let removal = response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .expect("removal cookie")
        .into_owned();
    assert!(removal.value().is_empty());
    assert_eq!(
        removal.max_age(),
        Some(actix_web::cookie::time::Duration::ZERO)
    );
}
