use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower::ServiceExt;

use recipe_api::app::build_app;
use recipe_api::config::AppConfig;
use recipe_api::state::AppState;

async fn test_app() -> (Router, SqlitePool) {
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("migrations");
    let config = Arc::new(AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
    });
    let state = AppState::from_parts(db.clone(), config);
    (build_app(state), db)
}

fn request(method: &str, path: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
    }
    match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.expect("request");
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn user_payload(username: &str, birthdate: &str) -> Value {
    json!({
        "username": username,
        "password": "testpassword",
        "email": format!("{username}@example.com"),
        "sex": "M",
        "birthdate": birthdate,
        "bio": "This is a test bio that is sufficiently long.",
    })
}

async fn register(app: &Router, username: &str, birthdate: &str) -> i64 {
    let (status, body) = send(
        app,
        request("POST", "/users/", None, Some(user_payload(username, birthdate))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register {username}: {body}");
    body["id"].as_i64().unwrap()
}

async fn login(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/login/",
            None,
            Some(json!({ "username": username, "password": "testpassword" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login {username}: {body}");
    body["token"].as_str().unwrap().to_string()
}

fn recipe_payload(title: &str, meal_type: &str, description: &str) -> Value {
    json!({
        "title": title,
        "description": description,
        "meal_type": meal_type,
        "ingredients": "test ingredients to pass the test",
    })
}

const OK_DESCRIPTION: &str = "a description long enough to pass the test";

#[tokio::test]
async fn health_endpoint_responds() {
    let (app, _db) = test_app().await;
    let (status, _) = send(&app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn registration_stores_slugified_username() {
    let (app, _db) = test_app().await;
    let (status, body) = send(
        &app,
        request("POST", "/users/", None, Some(user_payload("Chef One", "1995-01-01"))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "chef-one");
    assert_eq!(body["sex"], "M");
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn registration_rejects_denylisted_usernames() {
    let (app, _db) = test_app().await;
    for username in ["adminuser", "DogLover", "myCATpics"] {
        let (status, body) = send(
            &app,
            request("POST", "/users/", None, Some(user_payload(username, "1995-01-01"))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{username}");
        assert!(body.get("username").is_some(), "{username}: {body}");
    }
}

#[tokio::test]
async fn registration_rejects_short_bio_and_underage_together() {
    let (app, _db) = test_app().await;
    let mut payload = user_payload("admin", "2020-01-01");
    payload["bio"] = json!("too short");
    let (status, body) = send(&app, request("POST", "/users/", None, Some(payload))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    // all violations reported in one pass
    assert!(body.get("username").is_some());
    assert!(body.get("bio").is_some());
    assert!(body.get("birthdate").is_some());
}

#[tokio::test]
async fn duplicate_username_is_a_field_error() {
    let (app, _db) = test_app().await;
    register(&app, "chef1", "1995-01-01").await;
    let (status, body) = send(
        &app,
        request("POST", "/users/", None, Some(user_payload("chef1", "1995-01-01"))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("username").is_some());
}

#[tokio::test]
async fn renaming_to_a_taken_username_is_a_field_error() {
    let (app, db) = test_app().await;
    register(&app, "alice", "1995-01-01").await;
    let bob = register(&app, "bob", "1995-01-01").await;
    register(&app, "root", "1980-01-01").await;
    sqlx::query("UPDATE users SET is_staff = 1 WHERE username = 'root'")
        .execute(&db)
        .await
        .unwrap();
    let token = login(&app, "root").await;

    let (status, body) = send(
        &app,
        request(
            "PATCH",
            &format!("/users/{bob}/"),
            Some(&token),
            Some(json!({ "username": "alice" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(body.get("username").is_some());

    let (status, body) = send(&app, request("GET", &format!("/users/{bob}/"), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "bob");
}

#[tokio::test]
async fn unknown_enum_codes_are_rejected_as_bad_requests() {
    let (app, _db) = test_app().await;

    let mut payload = user_payload("chef1", "1995-01-01");
    payload["sex"] = json!("Male");
    let (status, body) = send(&app, request("POST", "/users/", None, Some(payload))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    register(&app, "chef2", "1995-01-01").await;
    let token = login(&app, "chef2").await;
    let mut payload = recipe_payload("pot roast", "D", OK_DESCRIPTION);
    payload["meal_type"] = json!("Z");
    let (status, body) = send(
        &app,
        request("POST", "/recipes/", Some(&token), Some(payload)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let (app, _db) = test_app().await;
    register(&app, "chef1", "1995-01-01").await;

    let (status, wrong_password) = send(
        &app,
        request(
            "POST",
            "/login/",
            None,
            Some(json!({ "username": "chef1", "password": "nope" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, unknown_user) = send(
        &app,
        request(
            "POST",
            "/login/",
            None,
            Some(json!({ "username": "nobody", "password": "nope" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_password, unknown_user);
}

#[tokio::test]
async fn logout_invalidates_the_token() {
    let (app, _db) = test_app().await;
    register(&app, "chef1", "1995-01-01").await;
    let token = login(&app, "chef1").await;

    let (status, body) = send(&app, request("POST", "/logout/", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");

    // the revoked token no longer authenticates
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/recipes/",
            Some(&token),
            Some(recipe_payload("stew", "D", OK_DESCRIPTION)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // logging out without a token is an authorization failure
    let (status, _) = send(&app, request("POST", "/logout/", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn relogin_keeps_the_previous_token_valid() {
    let (app, _db) = test_app().await;
    register(&app, "chef1", "1995-01-01").await;
    let first = login(&app, "chef1").await;
    let second = login(&app, "chef1").await;
    assert_ne!(first, second);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/recipes/",
            Some(&first),
            Some(recipe_payload("stew", "D", OK_DESCRIPTION)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn recipe_creation_requires_authentication() {
    let (app, _db) = test_app().await;
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/recipes/",
            None,
            Some(recipe_payload("stew", "D", OK_DESCRIPTION)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn recipe_validation_rejects_denylisted_title_and_short_description() {
    let (app, _db) = test_app().await;
    register(&app, "chef1", "1995-01-01").await;
    let token = login(&app, "chef1").await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/recipes/",
            Some(&token),
            Some(recipe_payload("stew with Uranium", "D", OK_DESCRIPTION)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("title").is_some());

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/recipes/",
            Some(&token),
            Some(recipe_payload("stew", "D", "too short")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("description").is_some());
}

#[tokio::test]
async fn only_the_owning_chef_may_mutate_a_recipe() {
    let (app, _db) = test_app().await;
    let chef_id = register(&app, "alice", "1995-01-01").await;
    register(&app, "mallory", "1995-01-01").await;
    let alice = login(&app, "alice").await;
    let mallory = login(&app, "mallory").await;

    let (status, created) = send(
        &app,
        request(
            "POST",
            "/recipes/",
            Some(&alice),
            Some(recipe_payload("Beef Stew", "D", OK_DESCRIPTION)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["chef"].as_i64().unwrap(), chef_id);
    assert_eq!(created["title"], "beef-stew");
    let recipe_id = created["id"].as_i64().unwrap();

    // anyone may read
    let (status, _) = send(
        &app,
        request("GET", &format!("/recipes/{recipe_id}/"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // a non-owner is forbidden
    let patch = json!({ "title": "Hijacked" });
    let (status, _) = send(
        &app,
        request(
            "PATCH",
            &format!("/recipes/{recipe_id}/"),
            Some(&mallory),
            Some(patch.clone()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(
        &app,
        request("DELETE", &format!("/recipes/{recipe_id}/"), Some(&mallory), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // the owner succeeds
    let (status, body) = send(
        &app,
        request(
            "PATCH",
            &format!("/recipes/{recipe_id}/"),
            Some(&alice),
            Some(json!({ "title": "Renamed Stew" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "renamed-stew");

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/recipes/{recipe_id}/"), Some(&alice), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        request("GET", &format!("/recipes/{recipe_id}/"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_writes_require_the_staff_flag() {
    let (app, db) = test_app().await;
    let target = register(&app, "victim", "1995-01-01").await;
    register(&app, "plain", "1995-01-01").await;
    let plain = login(&app, "plain").await;

    let patch = json!({ "first_name": "Changed" });

    let (status, _) = send(
        &app,
        request("PATCH", &format!("/users/{target}/"), None, Some(patch.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        request("PATCH", &format!("/users/{target}/"), Some(&plain), Some(patch.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    sqlx::query("UPDATE users SET is_staff = 1 WHERE username = 'plain'")
        .execute(&db)
        .await
        .unwrap();

    let (status, body) = send(
        &app,
        request("PATCH", &format!("/users/{target}/"), Some(&plain), Some(patch)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["first_name"], "Changed");

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/users/{target}/"), Some(&plain), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        request("GET", &format!("/users/{target}/"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_filters_compose_as_conjunction() {
    let (app, _db) = test_app().await;
    register(&app, "kirk", "1985-03-03").await;
    register(&app, "kate", "1995-05-05").await;
    register(&app, "bob", "2002-02-02").await;

    let (status, body) = send(
        &app,
        request("GET", "/users/?dob_gte=1990-01-01", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["kate", "bob"]);

    let (_, body) = send(
        &app,
        request(
            "GET",
            "/users/?username__contains=k&dob_gte=1990-01-01",
            None,
            None,
        ),
    )
    .await;
    let matched = body.as_array().unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0]["username"], "kate");

    let (_, body) = send(&app, request("GET", "/users/?username__startswith=ka", None, None)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(&app, request("GET", "/users/?username=kirk", None, None)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(&app, request("GET", "/users/?dob_lte=1990-01-01", None, None)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // unknown parameters are ignored, not rejected
    let (status, body) = send(&app, request("GET", "/users/?frobnicate=1", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn recipe_filters_and_limit() {
    let (app, _db) = test_app().await;
    register(&app, "alice", "1995-01-01").await;
    register(&app, "bob", "1995-01-01").await;
    let alice = login(&app, "alice").await;
    let bob = login(&app, "bob").await;

    for (title, meal_type, description) in [
        ("Pancakes", "B", "Fluffy and light breakfast food"),
        ("Lasagna", "D", "Layered pasta with cheese and sauce"),
        ("Omelette", "B", "Eggs folded around a soft filling"),
    ] {
        let (status, _) = send(
            &app,
            request(
                "POST",
                "/recipes/",
                Some(&alice),
                Some(recipe_payload(title, meal_type, description)),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/recipes/",
            Some(&bob),
            Some(recipe_payload("Salad", "L", "Crisp leaves with a sharp dressing")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let count = |body: &Value| body.as_array().unwrap().len();

    let (_, body) = send(&app, request("GET", "/recipes/?meal_type=B", None, None)).await;
    assert_eq!(count(&body), 2);

    let (_, body) = send(&app, request("GET", "/recipes/?chef=ali", None, None)).await;
    assert_eq!(count(&body), 3);

    let (_, body) = send(&app, request("GET", "/recipes/?title__startswith=pan", None, None)).await;
    assert_eq!(count(&body), 1);

    let (_, body) = send(
        &app,
        request("GET", "/recipes/?description__contains=fluffy", None, None),
    )
    .await;
    assert_eq!(count(&body), 1);

    // limit truncates after the other predicates, never before
    let (_, body) = send(&app, request("GET", "/recipes/?limit=2", None, None)).await;
    assert_eq!(count(&body), 2);

    let (_, body) = send(&app, request("GET", "/recipes/?meal_type=B&limit=1", None, None)).await;
    assert_eq!(count(&body), 1);

    let (_, body) = send(&app, request("GET", "/recipes/?limit=100", None, None)).await;
    assert_eq!(count(&body), 4);
}

#[tokio::test]
async fn recipe_images_are_normalized_to_300_by_300_jpeg() {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

    let (app, _db) = test_app().await;
    register(&app, "alice", "1995-01-01").await;
    let alice = login(&app, "alice").await;

    let png = {
        let img = image::RgbImage::from_pixel(20, 40, image::Rgb([200, 10, 10]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    };

    let mut payload = recipe_payload("Red Square Cake", "D", OK_DESCRIPTION);
    payload["image"] = json!(BASE64.encode(&png));
    let (status, created) = send(&app, request("POST", "/recipes/", Some(&alice), Some(payload))).await;
    assert_eq!(status, StatusCode::CREATED);

    let stored = BASE64
        .decode(created["image"].as_str().unwrap())
        .expect("stored image is base64");
    assert_eq!(
        image::guess_format(&stored).unwrap(),
        image::ImageFormat::Jpeg
    );
    let decoded = image::load_from_memory(&stored).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (300, 300));

    // garbage bytes are a validation error on the image field
    let mut payload = recipe_payload("Another Cake", "D", OK_DESCRIPTION);
    payload["image"] = json!(BASE64.encode(b"not an image"));
    let (status, body) = send(&app, request("POST", "/recipes/", Some(&alice), Some(payload))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("image").is_some());
}
