use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use jobboard_backend::middleware::auth::Claims;

/// Spins up the app against the database named by DATABASE_URL. Returns None
/// when no database is configured so the suite can run without one.
async fn setup() -> Option<(Router, PgPool)> {
    dotenvy::dotenv().ok();
    if env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set, skipping integration test");
        return None;
    }
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("JWT_SECRET", "test_secret_key");
    env::set_var("EMAIL_RELAY_URL", "http://127.0.0.1:1/send");
    env::set_var("EMAIL_FROM", "noreply@example.com");
    env::set_var("FCM_SEND_URL", "http://127.0.0.1:1/fcm");
    env::set_var("FCM_SERVER_KEY", "test_fcm_key");

    // Tests share a process; only the first call wins the OnceLock.
    let _ = jobboard_backend::config::init_config();
    let pool = jobboard_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    let state = jobboard_backend::AppState::new(pool.clone());
    Some((jobboard_backend::app(state), pool))
}

fn mint_token(user_id: Uuid, role: &str) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        role: Some(role.to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret("test_secret_key".as_bytes()),
    )
    .expect("mint token")
}

async fn seed_user(pool: &PgPool, role: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, username, email, role) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(format!("user_{}", id))
        .bind(format!("user_{}@example.com", id))
        .bind(role)
        .execute(pool)
        .await
        .expect("seed user");
    id
}

async fn seed_recruiter(pool: &PgPool, user_id: Uuid) -> Uuid {
    let company_id: Uuid = sqlx::query_scalar(
        "INSERT INTO companies (name, description, location) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(format!("Acme {}", user_id))
    .bind("Widgets")
    .bind("Berlin")
    .fetch_one(pool)
    .await
    .expect("seed company");

    sqlx::query_scalar(
        "INSERT INTO recruiter_profiles (user_id, company_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(user_id)
    .bind(company_id)
    .fetch_one(pool)
    .await
    .expect("seed recruiter profile")
}

async fn seed_job(pool: &PgPool, recruiter_profile_id: Uuid) -> Uuid {
    let company_id: Uuid =
        sqlx::query_scalar("SELECT company_id FROM recruiter_profiles WHERE id = $1")
            .bind(recruiter_profile_id)
            .fetch_one(pool)
            .await
            .expect("profile company");
    sqlx::query_scalar(
        r#"INSERT INTO jobs (recruiter_id, company_id, title, description, location)
           VALUES ($1, $2, $3, $4, $5) RETURNING id"#,
    )
    .bind(recruiter_profile_id)
    .bind(company_id)
    .bind("Backend Engineer")
    .bind("Rust services")
    .bind("Remote")
    .fetch_one(pool)
    .await
    .expect("seed job")
}

async fn seed_cv(pool: &PgPool, applicant_id: Uuid) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO cvs (applicant_id, title, file_url) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(applicant_id)
    .bind("My CV")
    .bind("https://files.example.com/cv.pdf")
    .fetch_one(pool)
    .await
    .expect("seed cv")
}

fn authed_request(method: &str, uri: &str, token: &str, body: Option<JsonValue>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token));
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(resp: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn protected_routes_require_token() {
    let Some((app, _pool)) = setup().await else {
        return;
    };

    let req = Request::builder()
        .method("GET")
        .uri("/api/my-applications")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Public job listing stays open.
    let req = Request::builder()
        .method("GET")
        .uri("/api/public/jobs")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn listing_rejects_out_of_range_page() {
    let Some((app, _pool)) = setup().await else {
        return;
    };

    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/public/jobs?page={}", i64::MAX))
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn apply_rejects_duplicates() {
    let Some((app, pool)) = setup().await else {
        return;
    };

    let seeker = seed_user(&pool, "job_seeker").await;
    let employer = seed_user(&pool, "employer").await;
    let profile = seed_recruiter(&pool, employer).await;
    let job = seed_job(&pool, profile).await;
    let cv = seed_cv(&pool, seeker).await;
    let token = mint_token(seeker, "job_seeker");

    let body = json!({ "cv_id": cv });
    let req = authed_request(
        "POST",
        &format!("/api/jobs/{}/apply", job),
        &token,
        Some(body.clone()),
    );
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = json_body(resp).await;
    assert_eq!(created["status"].as_str(), Some("pending"));

    let req = authed_request(
        "POST",
        &format!("/api/jobs/{}/apply", job),
        &token,
        Some(body),
    );
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE job_id = $1")
            .bind(job)
            .fetch_one(&pool)
            .await
            .expect("count applications");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn status_updates_enforce_ownership() {
    let Some((app, pool)) = setup().await else {
        return;
    };

    let seeker = seed_user(&pool, "job_seeker").await;
    let employer = seed_user(&pool, "employer").await;
    let other_employer = seed_user(&pool, "employer").await;
    let profile = seed_recruiter(&pool, employer).await;
    let _other_profile = seed_recruiter(&pool, other_employer).await;
    let job = seed_job(&pool, profile).await;
    let cv = seed_cv(&pool, seeker).await;

    let seeker_token = mint_token(seeker, "job_seeker");
    let req = authed_request(
        "POST",
        &format!("/api/jobs/{}/apply", job),
        &seeker_token,
        Some(json!({ "cv_id": cv })),
    );
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let application_id = json_body(resp).await["id"].as_str().unwrap().to_string();

    // Applicants cannot review their own application.
    let req = authed_request(
        "PATCH",
        &format!("/api/applications/{}/status", application_id),
        &seeker_token,
        Some(json!({ "status": "reviewed" })),
    );
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Nor can an employer who does not own the job.
    let other_token = mint_token(other_employer, "employer");
    let req = authed_request(
        "PATCH",
        &format!("/api/applications/{}/status", application_id),
        &other_token,
        Some(json!({ "status": "reviewed" })),
    );
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let status: String = sqlx::query_scalar("SELECT status FROM applications WHERE id = $1")
        .bind(Uuid::parse_str(&application_id).unwrap())
        .fetch_one(&pool)
        .await
        .expect("status");
    assert_eq!(status, "pending");

    // The job owner can, and an unknown status is rejected.
    let owner_token = mint_token(employer, "employer");
    let req = authed_request(
        "PATCH",
        &format!("/api/applications/{}/status", application_id),
        &owner_token,
        Some(json!({ "status": "shortlisted" })),
    );
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = authed_request(
        "PATCH",
        &format!("/api/applications/{}/status", application_id),
        &owner_token,
        Some(json!({ "status": "reviewed", "recruiter_notes": "solid" })),
    );
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = json_body(resp).await;
    assert_eq!(updated["status"].as_str(), Some("reviewed"));
    assert_eq!(updated["recruiter_notes"].as_str(), Some("solid"));
}

#[tokio::test]
async fn view_tracking_is_idempotent_and_saves_imply_views() {
    let Some((app, pool)) = setup().await else {
        return;
    };

    let seeker = seed_user(&pool, "job_seeker").await;
    let employer = seed_user(&pool, "employer").await;
    let profile = seed_recruiter(&pool, employer).await;
    let cv = seed_cv(&pool, seeker).await;
    let token = mint_token(employer, "employer");

    let req = authed_request("POST", &format!("/api/cvs/{}/view", cv), &token, None);
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let first = json_body(resp).await;
    assert_eq!(first["created"].as_bool(), Some(true));

    let req = authed_request("POST", &format!("/api/cvs/{}/view", cv), &token, None);
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let second = json_body(resp).await;
    assert_eq!(second["created"].as_bool(), Some(false));
    assert_eq!(first["id"], second["id"]);

    let views: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM cv_views WHERE cv_id = $1 AND viewer_id = $2")
            .bind(cv)
            .bind(profile)
            .fetch_one(&pool)
            .await
            .expect("count views");
    assert_eq!(views, 1);

    // Saving from a recruiter who never viewed records both actions.
    let other_employer = seed_user(&pool, "employer").await;
    let other_profile = seed_recruiter(&pool, other_employer).await;
    let other_token = mint_token(other_employer, "employer");
    let req = authed_request(
        "POST",
        &format!("/api/cvs/{}/save", cv),
        &other_token,
        Some(json!({ "notes": "strong candidate" })),
    );
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let save = json_body(resp).await;
    assert_eq!(save["created"].as_bool(), Some(true));
    assert_eq!(save["notes"].as_str(), Some("strong candidate"));

    let implied_view: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM cv_views WHERE cv_id = $1 AND viewer_id = $2")
            .bind(cv)
            .bind(other_profile)
            .fetch_one(&pool)
            .await
            .expect("count implied view");
    assert_eq!(implied_view, 1);
}

#[tokio::test]
async fn one_interview_per_application() {
    let Some((app, pool)) = setup().await else {
        return;
    };

    let seeker = seed_user(&pool, "job_seeker").await;
    let employer = seed_user(&pool, "employer").await;
    let profile = seed_recruiter(&pool, employer).await;
    let job = seed_job(&pool, profile).await;
    let cv = seed_cv(&pool, seeker).await;

    let seeker_token = mint_token(seeker, "job_seeker");
    let req = authed_request(
        "POST",
        &format!("/api/jobs/{}/apply", job),
        &seeker_token,
        Some(json!({ "cv_id": cv })),
    );
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let application_id = json_body(resp).await["id"].as_str().unwrap().to_string();

    let owner_token = mint_token(employer, "employer");
    let body = json!({
        "application_id": application_id,
        "scheduled_at": chrono::Utc::now() + chrono::Duration::days(3),
        "location": "HQ, Room 4",
    });
    let req = authed_request("POST", "/api/interviews", &owner_token, Some(body.clone()));
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Scheduling moves the application forward.
    let status: String = sqlx::query_scalar("SELECT status FROM applications WHERE id = $1")
        .bind(Uuid::parse_str(&application_id).unwrap())
        .fetch_one(&pool)
        .await
        .expect("status");
    assert_eq!(status, "interview");

    let req = authed_request("POST", "/api/interviews", &owner_token, Some(body));
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // The losing attempt rolls back whole: one interview, status untouched.
    let interviews: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM interviews WHERE application_id = $1")
            .bind(Uuid::parse_str(&application_id).unwrap())
            .fetch_one(&pool)
            .await
            .expect("count interviews");
    assert_eq!(interviews, 1);
    let status: String = sqlx::query_scalar("SELECT status FROM applications WHERE id = $1")
        .bind(Uuid::parse_str(&application_id).unwrap())
        .fetch_one(&pool)
        .await
        .expect("status after conflict");
    assert_eq!(status, "interview");
}

#[tokio::test]
async fn withdraw_only_in_early_stages() {
    let Some((app, pool)) = setup().await else {
        return;
    };

    let seeker = seed_user(&pool, "job_seeker").await;
    let employer = seed_user(&pool, "employer").await;
    let profile = seed_recruiter(&pool, employer).await;
    let job = seed_job(&pool, profile).await;
    let cv = seed_cv(&pool, seeker).await;

    let seeker_token = mint_token(seeker, "job_seeker");
    let req = authed_request(
        "POST",
        &format!("/api/jobs/{}/apply", job),
        &seeker_token,
        Some(json!({ "cv_id": cv })),
    );
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let application_id = json_body(resp).await["id"].as_str().unwrap().to_string();
    let application_uuid = Uuid::parse_str(&application_id).unwrap();

    sqlx::query("UPDATE applications SET status = 'accepted' WHERE id = $1")
        .bind(application_uuid)
        .execute(&pool)
        .await
        .expect("force accepted");

    let req = authed_request(
        "DELETE",
        &format!("/api/applications/{}", application_id),
        &seeker_token,
        None,
    );
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    sqlx::query("UPDATE applications SET status = 'pending' WHERE id = $1")
        .bind(application_uuid)
        .execute(&pool)
        .await
        .expect("reset pending");

    let req = authed_request(
        "DELETE",
        &format!("/api/applications/{}", application_id),
        &seeker_token,
        None,
    );
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE id = $1")
        .bind(application_uuid)
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(remaining, 0);
}
