use actix_web::http::StatusCode;
use actix_web::{test, App};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use chirp_service::middleware::{encode_token, Claims};
use chirp_service::repository::InMemoryChirpRepository;
use chirp_service::AppState;

const SECRET: &str = "http-test-secret-http-test-secret";

fn state(page_size: u32) -> AppState {
    AppState::new(
        Arc::new(InMemoryChirpRepository::new()),
        "memory",
        page_size,
        SECRET,
    )
}

struct TestAuthor {
    id: Uuid,
    bearer: String,
}

fn author(username: &str) -> TestAuthor {
    let id = Uuid::new_v4();
    let claims = Claims::new(
        id,
        username,
        &format!("{}@chirp.test", username.to_lowercase()),
        chrono::Duration::hours(1),
    );
    let token = encode_token(SECRET, &claims).expect("sign token");
    TestAuthor {
        id,
        bearer: format!("Bearer {}", token),
    }
}

macro_rules! app {
    ($state:expr) => {{
        let state = $state.clone();
        test::init_service(App::new().configure(move |cfg| state.configure(cfg))).await
    }};
}

#[actix_web::test]
async fn empty_public_timeline_has_one_page() {
    let state = state(32);
    let app = app!(state);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/v1/cheeps").to_request(),
    )
    .await;

    assert_eq!(body["items"], json!([]));
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 32);
    assert_eq!(body["total_pages"], 1);
}

#[actix_web::test]
async fn writes_require_a_valid_token() {
    let state = state(32);
    let app = app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/cheeps")
            .set_json(json!({"text": "hello"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/cheeps")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .set_json(json!({"text": "hello"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/timeline").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn post_cheep_then_comment_on_it() {
    let state = state(32);
    let app = app!(state);
    let helge = author("Helge");
    let adrian = author("Adrian");

    let cheep: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/cheeps")
            .insert_header(("Authorization", helge.bearer.as_str()))
            .set_json(json!({"text": "Hello, BDSA students!"}))
            .to_request(),
    )
    .await;
    assert_eq!(cheep["author"], "Helge");
    let cheep_id = cheep["id"].as_str().expect("cheep id").to_string();

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/cheeps/{}/comments", cheep_id))
            .insert_header(("Authorization", adrian.bearer.as_str()))
            .set_json(json!({"text": "Hi Helge"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let detail: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/cheeps/{}", cheep_id))
            .to_request(),
    )
    .await;
    assert_eq!(detail["cheep"]["text"], "Hello, BDSA students!");
    assert_eq!(detail["comments"][0]["author"], "Adrian");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/cheeps/{}/comments", Uuid::new_v4()))
            .insert_header(("Authorization", adrian.bearer.as_str()))
            .set_json(json!({"text": "into the void"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn cheep_text_is_validated() {
    let state = state(32);
    let app = app!(state);
    let helge = author("Helge");

    let too_long = "x".repeat(161);
    for text in ["", "   ", too_long.as_str()] {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/cheeps")
                .insert_header(("Authorization", helge.bearer.as_str()))
                .set_json(json!({ "text": text }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "text {:?}", text);
    }

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/cheeps")
            .insert_header(("Authorization", helge.bearer.as_str()))
            .set_json(json!({ "text": "ø".repeat(160) }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn pagination_walks_newest_first() {
    let state = state(2);
    let app = app!(state);
    let helge = author("Helge");

    for i in 1..=3 {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/cheeps")
                .insert_header(("Authorization", helge.bearer.as_str()))
                .set_json(json!({ "text": format!("cheep {}", i) }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let first: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/v1/cheeps?page=1").to_request(),
    )
    .await;
    assert_eq!(first["total_items"], 3);
    assert_eq!(first["total_pages"], 2);
    assert_eq!(first["items"][0]["text"], "cheep 3");
    assert_eq!(first["items"][1]["text"], "cheep 2");
    assert_eq!(first["has_next"], true);

    let second: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/v1/cheeps?page=2").to_request(),
    )
    .await;
    assert_eq!(second["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(second["has_next"], false);

    let beyond: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/v1/cheeps?page=7").to_request(),
    )
    .await;
    assert_eq!(beyond["items"], json!([]));

    let negative: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/v1/cheeps?page=-3").to_request(),
    )
    .await;
    assert_eq!(negative["page"], 1);
}

#[actix_web::test]
async fn follow_shapes_timeline_and_profile() {
    let state = state(32);
    let app = app!(state);
    let helge = author("Helge");
    let adrian = author("Adrian");

    for (who, text) in [(&helge, "from helge"), (&adrian, "from adrian")] {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/cheeps")
                .insert_header(("Authorization", who.bearer.as_str()))
                .set_json(json!({ "text": text }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/authors/Adrian/follow")
            .insert_header(("Authorization", helge.bearer.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let timeline: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/timeline")
            .insert_header(("Authorization", helge.bearer.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(timeline["total_items"], 2);

    let profile: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/authors/Adrian")
            .insert_header(("Authorization", helge.bearer.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(profile["is_following"], true);
    assert_eq!(profile["followers_count"], 1);
    assert!(profile.get("email").is_none());

    let followers: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/authors/Adrian/followers")
            .to_request(),
    )
    .await;
    assert_eq!(followers[0]["username"], "Helge");

    // Own author page is the private timeline
    let own: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/authors/Helge/cheeps")
            .insert_header(("Authorization", helge.bearer.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(own["total_items"], 2);

    let anonymous: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/authors/Helge/cheeps")
            .to_request(),
    )
    .await;
    assert_eq!(anonymous["total_items"], 1);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri("/api/v1/authors/Adrian/follow")
            .insert_header(("Authorization", helge.bearer.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let following: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/authors/Helge/following")
            .to_request(),
    )
    .await;
    assert_eq!(following, json!([]));
}

#[actix_web::test]
async fn follow_errors() {
    let state = state(32);
    let app = app!(state);
    let helge = author("Helge");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/authors/Helge/follow")
            .insert_header(("Authorization", helge.bearer.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/authors/Nobody/follow")
            .insert_header(("Authorization", helge.bearer.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn only_owner_deletes_cheep() {
    let state = state(32);
    let app = app!(state);
    let helge = author("Helge");
    let adrian = author("Adrian");

    let cheep: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/cheeps")
            .insert_header(("Authorization", helge.bearer.as_str()))
            .set_json(json!({"text": "mine"}))
            .to_request(),
    )
    .await;
    let uri = format!("/api/v1/cheeps/{}", cheep["id"].as_str().expect("id"));

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&uri)
            .insert_header(("Authorization", adrian.bearer.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&uri)
            .insert_header(("Authorization", helge.bearer.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn register_author_and_reject_duplicates() {
    let state = state(32);
    let app = app!(state);

    let body = json!({"username": "Rasmus", "email": "rnie@itu.dk"});
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/authors")
            .set_json(&body)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/authors")
            .set_json(&body)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/authors")
            .set_json(json!({"username": "Bad Name", "email": "x@y.dk"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn me_export_and_forget_me() {
    let state = state(32);
    let app = app!(state);
    let helge = author("Helge");
    let adrian = author("Adrian");

    for who in [&helge, &adrian] {
        test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/cheeps")
                .insert_header(("Authorization", who.bearer.as_str()))
                .set_json(json!({"text": "hi"}))
                .to_request(),
        )
        .await;
    }
    test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/authors/Helge/follow")
            .insert_header(("Authorization", adrian.bearer.as_str()))
            .to_request(),
    )
    .await;

    let me: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::put()
            .uri("/api/v1/me/image")
            .insert_header(("Authorization", helge.bearer.as_str()))
            .set_json(json!({"image_url": "https://img.chirp.test/helge.png"}))
            .to_request(),
    )
    .await;
    assert_eq!(me["email"], "helge@chirp.test");
    assert_eq!(me["image_url"], "https://img.chirp.test/helge.png");

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/me/export")
            .insert_header(("Authorization", helge.bearer.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("content-disposition"));
    let export: Value = test::read_body_json(resp).await;
    assert_eq!(export["followers"], json!(["Adrian"]));
    assert_eq!(export["cheeps"].as_array().map(Vec::len), Some(1));

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri("/api/v1/me")
            .insert_header(("Authorization", helge.bearer.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/authors/Helge")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let adrian_profile: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/authors/Adrian")
            .to_request(),
    )
    .await;
    assert_eq!(adrian_profile["following_count"], 0);

    let public: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/v1/cheeps").to_request(),
    )
    .await;
    assert_eq!(public["total_items"], 1);
    assert_eq!(public["items"][0]["author"], "Adrian");
    assert_ne!(helge.id, adrian.id);
}

#[actix_web::test]
async fn health_and_metrics_endpoints() {
    let state = state(32);
    let app = app!(state);

    for uri in ["/api/v1/health", "/api/v1/health/live", "/api/v1/health/ready"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
    }

    test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/cheeps").to_request(),
    )
    .await;
    let body = test::call_and_read_body(
        &app,
        test::TestRequest::get().uri("/metrics").to_request(),
    )
    .await;
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("chirp_http_requests_total"));
}

#[actix_web::test]
async fn reads_after_forget_me_do_not_recreate_the_author() {
    let state = state(32);
    let app = app!(state);
    let helge = author("Helge");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/cheeps")
            .insert_header(("Authorization", helge.bearer.as_str()))
            .set_json(json!({"text": "last words"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri("/api/v1/me")
            .insert_header(("Authorization", helge.bearer.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    for uri in ["/api/v1/me", "/api/v1/me/export"] {
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(uri)
                .insert_header(("Authorization", helge.bearer.as_str()))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
    }

    let timeline: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/timeline")
            .insert_header(("Authorization", helge.bearer.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(timeline["items"], json!([]));
    assert_eq!(timeline["total_items"], 0);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/authors/Helge")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn control_characters_in_usernames_are_rejected() {
    let state = state(32);
    let app = app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/authors")
            .set_json(json!({"username": "evil\u{1}", "email": "evil@chirp.test"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // A signed token cannot smuggle one in either
    let bell = author("bell\u{7}user");
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/cheeps")
            .insert_header(("Authorization", bell.bearer.as_str()))
            .set_json(json!({"text": "ding"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/me/export")
            .insert_header(("Authorization", bell.bearer.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn follow_status_reports_the_edge() {
    let state = state(32);
    let app = app!(state);
    let helge = author("Helge");
    let adrian = author("Adrian");

    for who in [&helge, &adrian] {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/cheeps")
                .insert_header(("Authorization", who.bearer.as_str()))
                .set_json(json!({"text": "hi"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let status = |bearer: String| {
        test::TestRequest::get()
            .uri("/api/v1/authors/Adrian/follow")
            .insert_header(("Authorization", bearer))
            .to_request()
    };

    let before: Value = test::call_and_read_body_json(&app, status(helge.bearer.clone())).await;
    assert_eq!(before, json!({"following": false}));

    test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/authors/Adrian/follow")
            .insert_header(("Authorization", helge.bearer.as_str()))
            .to_request(),
    )
    .await;

    let after: Value = test::call_and_read_body_json(&app, status(helge.bearer.clone())).await;
    assert_eq!(after, json!({"following": true}));

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/authors/Adrian/follow")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/authors/Nobody/follow")
            .insert_header(("Authorization", helge.bearer.as_str()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
