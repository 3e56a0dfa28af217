//! End-to-end page flows against the in-memory identity backend and a
//! recording chat backend.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode, header};

use common::{
    ADMIN_EMAIL, EMPLOYEE_EMAIL, FakeChat, PASSWORD, ROLE_KEY, TestApp, body_text, location,
    session_cookie, test_config,
};
use rag_portal::crypto::RoleTokenCipher;
use rag_portal::identity::{DocumentStore, IdentityProvider};
use rag_portal::users::Position;

const BOUNDARY: &str = "----portal-test-boundary";

/// (name, filename, content type, contents)
type Part<'a> = (&'a str, Option<&'a str>, Option<&'a str>, &'a str);

fn multipart_body(parts: &[Part<'_>]) -> String {
    let mut body = String::new();
    for (name, filename, content_type, contents) in parts {
        body.push_str(&format!("--{BOUNDARY}\r\n"));
        match filename {
            Some(filename) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n"
            )),
            None => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"\r\n"
            )),
        }
        if let Some(content_type) = content_type {
            body.push_str(&format!("Content-Type: {content_type}\r\n"));
        }
        body.push_str("\r\n");
        body.push_str(contents);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

async fn post_chat(app: &TestApp, cookie: &str, parts: &[Part<'_>]) -> axum::http::Response<Body> {
    let request = Request::post("/en/chat")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::COOKIE, cookie)
        .body(Body::from(multipart_body(parts)))
        .expect("request");
    app.send(request).await
}

// =============================================================================
// Routing
// =============================================================================

#[tokio::test]
async fn root_redirects_to_english_login() {
    let app = TestApp::new();

    let response = app.get("/", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/en/login");

    let response = app.get("/pt", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/pt/login");
}

#[tokio::test]
async fn unknown_locales_and_paths_are_not_found() {
    let app = TestApp::new();

    for uri in ["/xx/login", "/de", "/en/nowhere"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert!(body_text(response).await.contains("Page not found"));
    }
}

#[tokio::test]
async fn login_page_is_localized() {
    let app = TestApp::new();

    let response = app.get("/en/login", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Welcome back!"));

    let response = app.get("/es/login", None).await;
    let html = body_text(response).await;
    assert!(html.contains(r#"lang="es""#));
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn login_with_empty_password_is_rejected_before_sign_in() {
    let app = TestApp::new();

    let response = app
        .post_form("/en/login", "email=ana%40example.com&password=", None)
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(session_cookie(&response).is_none());
    let html = body_text(response).await;
    assert!(html.contains("Password is required."));
    assert!(html.contains("ana@example.com"));
}

#[tokio::test]
async fn login_with_wrong_password_shows_service_error() {
    let app = TestApp::new();

    let response = app
        .post_form("/en/login", "email=ana%40example.com&password=nope", None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(response).await.contains("Incorrect email or password."));

    let response = app
        .post_form("/en/login", "email=ghost%40example.com&password=secret1", None)
        .await;
    assert!(
        body_text(response)
            .await
            .contains("No account found with this email.")
    );
}

#[tokio::test]
async fn admins_land_on_dashboard_and_employees_on_chat() {
    let app = TestApp::new();

    let body = format!("email=ana%40example.com&password={PASSWORD}");
    let response = app.post_form("/pt/login", &body, None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/pt/dashboard");

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));

    let body = format!("email=bruno%40example.com&password={PASSWORD}");
    let response = app.post_form("/en/login", &body, None).await;
    assert_eq!(location(&response), "/en/chat");
    assert_eq!(app.state.sessions.len(), 2);
}

#[tokio::test]
async fn signed_in_users_skip_the_login_form() {
    let app = TestApp::new();
    let cookie = app.login(EMPLOYEE_EMAIL).await;

    let response = app.get("/es/login", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/es/chat");
}

// =============================================================================
// Access control
// =============================================================================

#[tokio::test]
async fn anonymous_visitors_are_sent_to_login() {
    let app = TestApp::new();

    let response = app.get("/en/dashboard", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/en/login");

    let response = app.get("/pt/chat", None).await;
    assert_eq!(location(&response), "/pt/login");

    let response = app
        .get("/en/chat", Some("portal_session=forged"))
        .await;
    assert_eq!(location(&response), "/en/login");
}

#[tokio::test]
async fn employees_are_kept_out_of_the_dashboard() {
    let app = TestApp::new();
    let cookie = app.login(EMPLOYEE_EMAIL).await;

    let response = app.get("/en/dashboard", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/en/unauthorized");

    let response = app
        .post_form(
            "/en/dashboard/users/u-admin/position",
            "position=employee",
            Some(&cookie),
        )
        .await;
    assert_eq!(location(&response), "/en/unauthorized");

    let response = app.get("/en/unauthorized", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_text(response).await.contains("Access denied"));
}

// =============================================================================
// Dashboard
// =============================================================================

#[tokio::test]
async fn dashboard_lists_and_filters_users() {
    let app = TestApp::new();
    let cookie = app.login(ADMIN_EMAIL).await;

    let response = app.get("/en/dashboard", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Admin Panel"));
    assert!(html.contains("bruno@example.com"));
    assert_eq!(html.matches(r#"class="inline-form""#).count(), 2);

    let response = app
        .get("/en/dashboard?search=BRU&position=all", Some(&cookie))
        .await;
    let html = body_text(response).await;
    assert_eq!(html.matches(r#"class="inline-form""#).count(), 1);
    assert!(html.contains("bruno@example.com"));

    let response = app
        .get("/en/dashboard?position=manager", Some(&cookie))
        .await;
    let html = body_text(response).await;
    assert_eq!(html.matches(r#"class="inline-form""#).count(), 0);
    assert!(html.contains("No users found."));
}

#[tokio::test]
async fn admin_changes_a_position() {
    let app = TestApp::new();
    let cookie = app.login(ADMIN_EMAIL).await;

    let response = app
        .post_form(
            "/en/dashboard/users/u-employee/position",
            "position=manager&return_to=search%3Dbruno%26page%3D1",
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/en/dashboard?search=bruno&position=all&page=1"
    );

    let auth = app
        .identity
        .sign_in(ADMIN_EMAIL, PASSWORD)
        .await
        .expect("sign in");
    let record = app
        .identity
        .get_user(&auth.id_token, "u-employee")
        .await
        .expect("lookup")
        .expect("document");
    assert_eq!(record.position, Position::Manager);

    let cipher = RoleTokenCipher::from_base64(ROLE_KEY).expect("key");
    assert_eq!(
        cipher.open_position(&record.token_key).expect("open"),
        Position::Manager
    );

    let response = app.get("/en/dashboard", Some(&cookie)).await;
    assert!(body_text(response).await.contains("Position updated."));
}

#[tokio::test]
async fn invalid_positions_are_bad_requests() {
    let app = TestApp::new();
    let cookie = app.login(ADMIN_EMAIL).await;

    let response = app
        .post_form(
            "/en/dashboard/users/u-employee/position",
            "position=overlord",
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn saving_without_a_position_renders_the_error_page() {
    let app = TestApp::new();
    let cookie = app.login(ADMIN_EMAIL).await;

    let response = app
        .post_form(
            "/en/dashboard/users/u-employee/position",
            "return_to=page%3D2",
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("Something went wrong"));
}

#[tokio::test]
async fn path_like_user_ids_are_rejected() {
    let app = TestApp::new();
    let cookie = app.login(ADMIN_EMAIL).await;

    let response = app
        .post_form(
            "/en/dashboard/users/..%2FAdmins%2Froot/position",
            "position=main-admin",
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get("/en/dashboard", Some(&cookie)).await;
    let html = body_text(response).await;
    assert!(!html.contains("Position updated."));
    assert!(!html.contains("Could not update the position."));
}

#[tokio::test]
async fn failed_position_update_is_flashed() {
    let app = TestApp::new();
    let cookie = app.login(ADMIN_EMAIL).await;

    let response = app
        .post_form(
            "/en/dashboard/users/u-missing/position",
            "position=employee",
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app.get("/en/dashboard", Some(&cookie)).await;
    assert!(
        body_text(response)
            .await
            .contains("Could not update the position.")
    );
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn registration_validates_passwords() {
    let app = TestApp::new();

    let response = app
        .post_form(
            "/en/register",
            "name=Carla&email=carla%40example.com&password=abc&confirmPassword=abc",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        body_text(response)
            .await
            .contains("Password must be at least 6 characters.")
    );

    let response = app
        .post_form(
            "/en/register",
            "name=Carla&email=carla%40example.com&password=abcdef&confirmPassword=abcdeg",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("Passwords do not match."));
}

#[tokio::test]
async fn registration_creates_an_employee() {
    let app = TestApp::new();

    let response = app
        .post_form(
            "/en/register",
            "name=Carla+Dias&email=carla%40example.com&password=abcdef&confirmPassword=abcdef",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Account created successfully!"));
    assert!(html.contains(r#"content="3;url=/en/login""#));
    assert_eq!(
        app.identity.display_name("carla@example.com").as_deref(),
        Some("Carla Dias")
    );

    let auth = app
        .identity
        .sign_in("carla@example.com", "abcdef")
        .await
        .expect("new account signs in");
    let record = app
        .identity
        .get_user(&auth.id_token, &auth.uid)
        .await
        .expect("lookup")
        .expect("document stored");
    assert_eq!(record.position, Position::Employee);
    assert!(record.terms_accepted);
    let cipher = RoleTokenCipher::from_base64(ROLE_KEY).expect("key");
    assert_eq!(
        cipher.open_position(&record.token_key).expect("open"),
        Position::Employee
    );

    let response = app
        .post_form("/en/login", "email=carla%40example.com&password=abcdef", None)
        .await;
    assert_eq!(location(&response), "/en/chat");
}

#[tokio::test]
async fn registration_reports_duplicate_email() {
    let app = TestApp::new();

    let response = app
        .post_form(
            "/en/register",
            "name=Ana&email=ana%40example.com&password=abcdef&confirmPassword=abcdef",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(
        body_text(response)
            .await
            .contains("This email is already in use.")
    );
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn chat_relays_question_files_and_token() {
    let app = TestApp::new();
    let cookie = app.login(EMPLOYEE_EMAIL).await;

    let response = post_chat(
        &app,
        &cookie,
        &[
            ("question", None, None, "What is RAG?"),
            ("file", Some("notes.pdf"), Some("application/pdf"), "%PDF-1.4"),
            ("file", Some("tool.exe"), Some("application/octet-stream"), "MZ"),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/en/chat");

    let requests = app.chat.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].question, "What is RAG?");
    assert_eq!(requests[0].files.len(), 1);
    assert_eq!(requests[0].files[0].filename, "notes.pdf");
    assert_eq!(requests[0].files[0].bytes, b"%PDF-1.4");

    let cipher = RoleTokenCipher::from_base64(ROLE_KEY).expect("key");
    assert_eq!(
        cipher.open_position(&requests[0].token).expect("open"),
        Position::Employee
    );

    let html = body_text(app.get("/en/chat", Some(&cookie)).await).await;
    assert!(html.contains("What is RAG?<br>Uploaded files: notes.pdf"));
    assert!(html.contains("Hello from the assistant"));
    assert!(html.contains("Only PDF, DOCX, TXT, MD, and RTF files are allowed."));
}

#[tokio::test]
async fn file_only_messages_use_placeholder_question() {
    let app = TestApp::new();
    let cookie = app.login(EMPLOYEE_EMAIL).await;

    post_chat(
        &app,
        &cookie,
        &[
            ("question", None, None, "  "),
            ("file", Some("readme.md"), None, "# notes"),
        ],
    )
    .await;

    let requests = app.chat.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].question, "File upload");
    assert_eq!(requests[0].files[0].filename, "readme.md");
}

#[tokio::test]
async fn empty_submissions_are_ignored() {
    let app = TestApp::new();
    let cookie = app.login(EMPLOYEE_EMAIL).await;

    let response = post_chat(
        &app,
        &cookie,
        &[
            ("question", None, None, ""),
            ("file", Some(""), Some("application/octet-stream"), ""),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(app.chat.requests().is_empty());
}

#[tokio::test]
async fn backend_failures_and_empty_replies_are_reported() {
    let app = TestApp::with(test_config(), FakeChat::failing());
    let cookie = app.login(EMPLOYEE_EMAIL).await;
    post_chat(&app, &cookie, &[("question", None, None, "Hi")]).await;
    let html = body_text(app.get("/en/chat", Some(&cookie)).await).await;
    assert!(html.contains("Error sending message. Please try again."));

    let app = TestApp::with(test_config(), FakeChat::answering(None));
    let cookie = app.login(EMPLOYEE_EMAIL).await;
    post_chat(&app, &cookie, &[("question", None, None, "Hi")]).await;
    let html = body_text(app.get("/en/chat", Some(&cookie)).await).await;
    assert!(html.contains("No response received"));
}

#[tokio::test]
async fn oversized_uploads_are_rejected_with_413() {
    let mut config = test_config();
    config.chat.max_upload_bytes = 1024;
    let app = TestApp::with(config, FakeChat::answering(Some("ok")));
    let cookie = app.login(EMPLOYEE_EMAIL).await;

    let big = "a".repeat(4096);
    let response = post_chat(
        &app,
        &cookie,
        &[
            ("question", None, None, "Summarize"),
            ("file", Some("notes.txt"), Some("text/plain"), big.as_str()),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body_text(response).await.contains("The upload is too large."));
    assert!(app.chat.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_backends_hit_the_request_timeout() {
    let mut config = test_config();
    config.resilience.request_timeout_secs = 1;
    let app = TestApp::with(config, FakeChat::slow(Duration::from_secs(3)));
    let cookie = app.login(EMPLOYEE_EMAIL).await;

    let response = post_chat(&app, &cookie, &[("question", None, None, "Hi")]).await;
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    assert!(body_text(response).await.contains("The request took too long."));
}

#[tokio::test]
async fn conversations_are_archived_and_reopened() {
    let app = TestApp::new();
    let cookie = app.login(EMPLOYEE_EMAIL).await;

    post_chat(&app, &cookie, &[("question", None, None, "First question")]).await;

    let response = app.post_form("/en/chat/new", "", Some(&cookie)).await;
    assert_eq!(location(&response), "/en/chat");
    let html = body_text(app.get("/en/chat", Some(&cookie)).await).await;
    assert!(html.contains(r#"action="/en/chat/conversations/0""#));
    assert!(!html.contains("Hello from the assistant"));

    let response = app
        .post_form("/en/chat/conversations/0", "", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let html = body_text(app.get("/en/chat", Some(&cookie)).await).await;
    assert!(html.contains("Hello from the assistant"));

    let response = app
        .post_form("/en/chat/conversations/7", "", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admins_see_the_dashboard_link_in_chat() {
    let app = TestApp::new();

    let cookie = app.login(ADMIN_EMAIL).await;
    let html = body_text(app.get("/en/chat", Some(&cookie)).await).await;
    assert!(html.contains(r#"href="/en/dashboard""#));

    let cookie = app.login(EMPLOYEE_EMAIL).await;
    let html = body_text(app.get("/en/chat", Some(&cookie)).await).await;
    assert!(!html.contains(r#"href="/en/dashboard""#));
}

// =============================================================================
// Logout and rate limiting
// =============================================================================

#[tokio::test]
async fn logout_drops_the_session() {
    let app = TestApp::new();
    let cookie = app.login(EMPLOYEE_EMAIL).await;

    let response = app.post_form("/pt/logout", "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/pt/login");
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(cleared.starts_with("portal_session="));
    assert!(cleared.contains("Max-Age=0"));

    assert!(app.state.sessions.is_empty());
    let response = app.get("/en/chat", Some(&cookie)).await;
    assert_eq!(location(&response), "/en/login");
}

fn login_attempt_from(peer: &str, body: &str) -> Request<Body> {
    let addr: SocketAddr = peer.parse().expect("socket address");
    let mut request = Request::post("/en/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("request");
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

#[tokio::test]
async fn credential_posts_are_rate_limited() {
    let mut config = test_config();
    config.resilience.rate_limit_enabled = true;
    config.resilience.requests_per_second = 1;
    config.resilience.burst_size = 1;
    let app = TestApp::with(config, FakeChat::answering(None));

    let first = app
        .post_form("/en/login", "email=ana%40example.com&password=nope", None)
        .await;
    assert_eq!(first.status(), StatusCode::UNAUTHORIZED);

    let second = app
        .post_form("/en/login", "email=ana%40example.com&password=nope", None)
        .await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    // Page views are not limited
    let page = app.get("/en/login", None).await;
    assert_eq!(page.status(), StatusCode::OK);
}

#[tokio::test]
async fn one_clients_burst_does_not_lock_out_another() {
    let mut config = test_config();
    config.resilience.rate_limit_enabled = true;
    config.resilience.requests_per_second = 1;
    config.resilience.burst_size = 10;
    let app = TestApp::with(config, FakeChat::answering(None));

    for _ in 0..10 {
        let response = app
            .send(login_attempt_from(
                "203.0.113.7:40000",
                "email=x%40evil.io&password=nope",
            ))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let blocked = app
        .send(login_attempt_from(
            "203.0.113.7:40001",
            "email=x%40evil.io&password=nope",
        ))
        .await;
    assert_eq!(blocked.status(), StatusCode::TOO_MANY_REQUESTS);

    let legit = app
        .send(login_attempt_from(
            "198.51.100.20:50000",
            &format!("email=ana%40example.com&password={PASSWORD}"),
        ))
        .await;
    assert_eq!(legit.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&legit), "/en/dashboard");
}
