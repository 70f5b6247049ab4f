mod common;

#[tokio::test]
async fn login_with_default_credentials_returns_hex_token() {
    let env = common::TestEnv::start();

    let response = env
        .server
        .post("/api/auth/login")
        .json(&serde_json::json!({
            "username": "mamu",
            "password": "admin123"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"].as_bool(), Some(true));

    let token = body["token"].as_str().expect("token present");
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn login_wrong_password_is_unauthorized() {
    let env = common::TestEnv::start();

    let response = env
        .server
        .post("/api/auth/login")
        .json(&serde_json::json!({
            "username": "mamu",
            "password": "wrong"
        }))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn login_unknown_user_gets_same_answer_as_wrong_password() {
    let env = common::TestEnv::start();

    let wrong_user = env
        .server
        .post("/api/auth/login")
        .json(&serde_json::json!({"username": "nobody", "password": "admin123"}))
        .await;
    let wrong_pass = env
        .server
        .post("/api/auth/login")
        .json(&serde_json::json!({"username": "mamu", "password": "nope"}))
        .await;

    wrong_user.assert_status_unauthorized();
    wrong_pass.assert_status_unauthorized();
    let a: serde_json::Value = wrong_user.json();
    let b: serde_json::Value = wrong_pass.json();
    assert_eq!(a["error"], b["error"]);
}

#[tokio::test]
async fn verify_with_session_succeeds() {
    let env = common::TestEnv::start();
    let token = env.login().await;

    let response = env
        .server
        .get("/api/auth/verify")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn verify_without_header_is_unauthorized() {
    let env = common::TestEnv::start();
    let response = env.server.get("/api/auth/verify").await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn verify_with_malformed_header_is_unauthorized() {
    let env = common::TestEnv::start();
    let response = env
        .server
        .get("/api/auth/verify")
        .add_header("Authorization", "Token abc123")
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn verify_with_unknown_token_is_unauthorized() {
    let env = common::TestEnv::start();
    let response = env
        .server
        .get("/api/auth/verify")
        .authorization_bearer("0".repeat(64))
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let env = common::TestEnv::start();
    let token = env.login().await;

    env.server
        .post("/api/auth/logout")
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    let response = env
        .server
        .get("/api/auth/verify")
        .authorization_bearer(&token)
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn change_password_full_flow() {
    let env = common::TestEnv::start();
    let token = env.login().await;

    // Wrong old password.
    env.server
        .post("/api/auth/change-password")
        .authorization_bearer(&token)
        .json(&serde_json::json!({
            "old_password": "wrong",
            "new_password": "longenough"
        }))
        .await
        .assert_status_unauthorized();

    // New password too short.
    env.server
        .post("/api/auth/change-password")
        .authorization_bearer(&token)
        .json(&serde_json::json!({
            "old_password": "admin123",
            "new_password": "abc"
        }))
        .await
        .assert_status_bad_request();

    // Valid change.
    env.server
        .post("/api/auth/change-password")
        .authorization_bearer(&token)
        .json(&serde_json::json!({
            "old_password": "admin123",
            "new_password": "s3cret-new"
        }))
        .await
        .assert_status_ok();

    // Old credentials no longer log in; new ones do.
    env.server
        .post("/api/auth/login")
        .json(&serde_json::json!({"username": "mamu", "password": "admin123"}))
        .await
        .assert_status_unauthorized();

    env.server
        .post("/api/auth/login")
        .json(&serde_json::json!({"username": "mamu", "password": "s3cret-new"}))
        .await
        .assert_status_ok();
}
