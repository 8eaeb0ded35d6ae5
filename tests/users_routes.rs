use news_api::auth::{AuthConfig, AuthState, JwtService, PasswordService};
use news_api::error::ApiError;
use news_api::routes::users::{
    LoginResponse, PreferencesResponse, PreferencesUpdateResponse, SignupResponse, get_preferences,
    login, signup, update_preferences,
};
use news_api::test_support::{TestDatabase, TestDatabaseError, TestRocketBuilder};
use news_api::users::{UserStore, UserStoreError};
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use rocket::routes;
use rocket::serde::json::{Value, json};

const TEST_JWT_SECRET: &str = "test-users-secret";

fn test_auth_state() -> AuthState {
    let config = AuthConfig {
        issuer: "news-api-test".into(),
        audience: "news-api-test".into(),
        access_token_ttl_secs: 900,
        jwt_secret: TEST_JWT_SECRET.into(),
    };
    let password_service = PasswordService::new().expect("password service");
    let jwt_service = JwtService::from_config(&config).expect("jwt service");
    AuthState::new(config, password_service, jwt_service)
}

async fn setup(test_name: &str) -> Option<(TestDatabase, Client)> {
    let test_db = match TestDatabase::new().await {
        Ok(db) => db,
        Err(TestDatabaseError::Container(err)) => {
            eprintln!("skipping {test_name}: no container runtime ({err})");
            return None;
        }
        Err(err) => panic!("failed to provision test database: {err:?}"),
    };

    let client = TestRocketBuilder::new()
        .manage_pg_pool(test_db.pool_clone())
        .manage_auth_state(test_auth_state())
        .mount_routes(routes![signup, login, get_preferences, update_preferences])
        .async_client()
        .await;

    Some((test_db, client))
}

async fn post_json(client: &Client, uri: &'static str, body: Value) -> (Status, Value) {
    let response = client
        .post(uri)
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch()
        .await;
    let status = response.status();
    let body = response.into_json::<Value>().await.expect("JSON body");
    (status, body)
}

async fn signup_and_login(client: &Client, email: &str, preferences: Value) -> String {
    let (status, _) = post_json(
        client,
        "/users/signup",
        json!({
            "name": "Clark Kent",
            "email": email,
            "password": "Krypt0n!",
            "preferences": preferences
        }),
    )
    .await;
    assert_eq!(status, Status::Ok);

    let (status, body) = post_json(
        client,
        "/users/login",
        json!({"email": email, "password": "Krypt0n!"}),
    )
    .await;
    assert_eq!(status, Status::Ok);
    body["token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn signup_returns_public_user() {
    let Some((test_db, client)) = setup("signup test").await else {
        return;
    };

    let response = client
        .post("/users/signup")
        .header(ContentType::JSON)
        .body(
            json!({
                "name": "Clark Kent",
                "email": "Clark@Superman.com",
                "password": "Krypt0n!",
                "preferences": ["movies", "comics"]
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let raw: Value = response.into_json().await.expect("JSON body");
    assert!(raw["user"].get("password_hash").is_none());
    assert!(raw["user"].get("createdAt").is_some());

    let payload: SignupResponse = serde_json::from_value(raw).expect("signup payload");
    assert_eq!(payload.message, "User created successfully");
    assert_eq!(payload.user.name, "Clark Kent");
    assert_eq!(payload.user.email, "clark@superman.com");
    assert_eq!(payload.user.preferences, vec!["movies", "comics"]);

    test_db.close().await.expect("failed to stop test database");
}

#[tokio::test]
async fn signup_rejects_duplicates_and_invalid_payloads() {
    let Some((test_db, client)) = setup("signup validation test").await else {
        return;
    };

    let user = json!({"name": "Bruce", "email": "bruce@wayne.com", "password": "batcave"});
    let (status, _) = post_json(&client, "/users/signup", user).await;
    assert_eq!(status, Status::Ok);

    let (status, body) = post_json(
        &client,
        "/users/signup",
        json!({"name": "Bruce W", "email": "BRUCE@wayne.com", "password": "batcave"}),
    )
    .await;
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["error"], "User already exists");

    let (status, body) = post_json(
        &client,
        "/users/signup",
        json!({"name": "Robin", "email": "robin", "password": "123"}),
    )
    .await;
    assert_eq!(status, Status::BadRequest);
    assert_eq!(
        body["error"],
        "Invalid email format, Password must be at least 6 characters"
    );

    let (status, body) = post_json(
        &client,
        "/users/signup",
        json!({"name": 5, "email": "robin@wayne.com", "password": "birdsong"}),
    )
    .await;
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["error"], "\"name\" must be a string");

    let response = client
        .post("/users/signup")
        .header(ContentType::JSON)
        .body("{not json")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    let body: Value = response.into_json().await.expect("JSON body");
    assert_eq!(body["error"], "Invalid JSON in request body");

    test_db.close().await.expect("failed to stop test database");
}

#[tokio::test]
async fn login_issues_token_and_rejects_bad_credentials() {
    let Some((test_db, client)) = setup("login test").await else {
        return;
    };

    let (status, _) = post_json(
        &client,
        "/users/signup",
        json!({"name": "Diana", "email": "diana@themyscira.org", "password": "lasso123"}),
    )
    .await;
    assert_eq!(status, Status::Ok);

    let (status, body) = post_json(
        &client,
        "/users/login",
        json!({"email": "Diana@Themyscira.org", "password": "lasso123"}),
    )
    .await;
    assert_eq!(status, Status::Ok);
    let payload: LoginResponse = serde_json::from_value(body).expect("login payload");
    assert_eq!(payload.message, "Login successful");
    assert!(!payload.token.is_empty());

    let (status, body) = post_json(
        &client,
        "/users/login",
        json!({"email": "diana@themyscira.org", "password": "wrong-password"}),
    )
    .await;
    assert_eq!(status, Status::Unauthorized);
    assert_eq!(body["error"], "Invalid email or password");

    let (status, body) = post_json(
        &client,
        "/users/login",
        json!({"email": "nobody@themyscira.org", "password": "lasso123"}),
    )
    .await;
    assert_eq!(status, Status::Unauthorized);
    assert_eq!(body["error"], "Invalid email or password");

    let (status, body) = post_json(&client, "/users/login", json!({"email": "diana@themyscira.org"})).await;
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["error"], "Password is required");

    test_db.close().await.expect("failed to stop test database");
}

#[tokio::test]
async fn preferences_round_trip_for_authenticated_user() {
    let Some((test_db, client)) = setup("preferences test").await else {
        return;
    };

    let token = signup_and_login(&client, "clark@superman.com", json!(["movies"])).await;
    let auth = || Header::new("Authorization", format!("Bearer {token}"));

    let response = client.get("/users/preferences").header(auth()).dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let payload: PreferencesResponse = response.into_json().await.expect("JSON body");
    assert_eq!(payload.preferences, vec!["movies"]);

    let response = client
        .put("/users/preferences")
        .header(auth())
        .header(ContentType::JSON)
        .body(json!({"preferences": ["technology", "science"]}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let payload: PreferencesUpdateResponse = response.into_json().await.expect("JSON body");
    assert_eq!(payload.message, "Preferences updated successfully");
    assert_eq!(payload.preferences, vec!["technology", "science"]);

    let response = client.get("/users/preferences").header(auth()).dispatch().await;
    let payload: PreferencesResponse = response.into_json().await.expect("JSON body");
    assert_eq!(payload.preferences, vec!["technology", "science"]);

    let response = client
        .put("/users/preferences")
        .header(auth())
        .header(ContentType::JSON)
        .body(json!({"preferences": "technology"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    let body: Value = response.into_json().await.expect("JSON body");
    assert_eq!(body["error"], "Preferences must be an array");

    test_db.close().await.expect("failed to stop test database");
}

#[tokio::test]
async fn preferences_require_a_valid_token() {
    let Some((test_db, client)) = setup("preferences auth test").await else {
        return;
    };

    let response = client.get("/users/preferences").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
    let body: Value = response.into_json().await.expect("JSON body");
    assert_eq!(body["error"], "Access token required");

    let response = client
        .get("/users/preferences")
        .header(Header::new("Authorization", "Bearer not-a-jwt"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
    let body: Value = response.into_json().await.expect("JSON body");
    assert_eq!(body["error"], "Invalid or expired token");

    test_db.close().await.expect("failed to stop test database");
}

#[tokio::test]
async fn updating_preferences_of_missing_user_is_not_found() {
    let test_db = match TestDatabase::new().await {
        Ok(db) => db,
        Err(TestDatabaseError::Container(err)) => {
            eprintln!("skipping missing user update test: no container runtime ({err})");
            return;
        }
        Err(err) => panic!("failed to provision test database: {err:?}"),
    };

    let store = UserStore::new(test_db.pool_clone());
    let err = store
        .update_preferences(987_654, &["science".to_string()])
        .await
        .expect_err("no row to update");
    assert!(matches!(err, UserStoreError::NotFound));
    assert_eq!(err.to_string(), "User not found");

    match ApiError::from(err) {
        ApiError::NotFound(message) => assert_eq!(message, "User not found"),
        other => panic!("expected a 404 error, got {other:?}"),
    }

    test_db.close().await.expect("failed to stop test database");
}
