use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use tallybank_api::config::AppConfig;
use tallybank_auth::JwtClaims;
use tallybank_core::UserId;

const JWT_SECRET: &str = "test-secret";
const API_KEY: &str = "test-api-key";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build app (same router as prod, in-memory store), bound to an ephemeral port.
        let config = AppConfig {
            jwt_secret: JWT_SECRET.to_string(),
            api_key: API_KEY.to_string(),
            database_url: None,
            ..AppConfig::default()
        };
        let app = tallybank_api::app::build_app(&config)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(secret: &str, sub: UserId) -> String {
    let claims = JwtClaims::new(sub, Utc::now(), ChronoDuration::minutes(10));

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

/// An authenticated user talking to the server.
struct Client {
    http: reqwest::Client,
    token: String,
}

impl Client {
    fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            token: mint_jwt(JWT_SECRET, UserId::new()),
        }
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .bearer_auth(&self.token)
            .header("X-API-KEY", API_KEY)
    }

    fn post(&self, url: String) -> reqwest::RequestBuilder {
        self.http
            .post(url)
            .bearer_auth(&self.token)
            .header("X-API-KEY", API_KEY)
    }

    async fn open_account(&self, srv: &TestServer, deposit: Value) -> Value {
        let res = self
            .post(srv.url("/accounts"))
            .json(&json!({ "initial_deposit": deposit }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["message"], "Bank account created successfully");
        body["account"].clone()
    }

    async fn balance(&self, srv: &TestServer, id: &Value) -> String {
        let res = self
            .get(srv.url(&format!("/accounts/{id}/balance")))
            .header("X-Account-Identifier-Type", "id")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["balance"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn health_needs_no_credentials() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn token_and_api_key_are_both_required() {
    let srv = TestServer::spawn().await;
    let http = reqwest::Client::new();
    let token = mint_jwt(JWT_SECRET, UserId::new());

    // Neither.
    let res = http.get(srv.url("/accounts")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");

    // Token only.
    let res = http
        .get(srv.url("/accounts"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Wrong key.
    let res = http
        .get(srv.url("/accounts"))
        .bearer_auth(&token)
        .header("X-API-KEY", "nope")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Key only.
    let res = http
        .get(srv.url("/accounts"))
        .header("X-API-KEY", API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Token signed with another secret.
    let res = http
        .get(srv.url("/accounts"))
        .bearer_auth(mint_jwt("other-secret", UserId::new()))
        .header("X-API-KEY", API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Both.
    let res = http
        .get(srv.url("/accounts"))
        .bearer_auth(&token)
        .header("X-API-KEY", API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn account_creation_and_lookup_by_both_kinds() {
    let srv = TestServer::spawn().await;
    let me = Client::new();

    let account = me.open_account(&srv, json!(1000)).await;
    assert_eq!(account["balance"], "1000.00");
    assert_eq!(account["currency"], "GBP");
    let number = account["account_number"].as_str().unwrap().to_string();
    assert!(number.starts_with("ACC-"));

    let res = me
        .get(srv.url(&format!("/accounts/{}", account["id"])))
        .header("X-Account-Identifier-Type", "id")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let by_id: Value = res.json().await.unwrap();
    assert_eq!(by_id["account_number"], number.as_str());

    let res = me
        .get(srv.url(&format!("/accounts/{number}")))
        .header("X-Account-Identifier-Type", "NUMBER")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let by_number: Value = res.json().await.unwrap();
    assert_eq!(by_number["id"], account["id"]);

    let res = me.get(srv.url("/accounts")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let list: Vec<Value> = res.json().await.unwrap();
    assert_eq!(list.len(), 1);
}

#[tokio::test]
async fn invalid_deposits_are_unprocessable() {
    let srv = TestServer::spawn().await;
    let me = Client::new();

    for body in [
        json!({ "initial_deposit": -500 }),
        json!({ "initial_deposit": "invalid_string" }),
        json!({}),
    ] {
        let res = me.post(srv.url("/accounts")).json(&body).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let err: Value = res.json().await.unwrap();
        assert_eq!(err["error"], "validation_error");
        assert!(err["errors"]["initial_deposit"].is_array());
    }

    let res = me
        .post(srv.url("/accounts"))
        .header("Content-Type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn identifier_kind_header_is_required() {
    let srv = TestServer::spawn().await;
    let me = Client::new();
    let account = me.open_account(&srv, json!(10)).await;

    let res = me
        .get(srv.url(&format!("/accounts/{}", account["id"])))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = me
        .get(srv.url(&format!("/accounts/{}/balance", account["id"])))
        .header("X-Account-Identifier-Type", "iban")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid or missing X-Account-Identifier-Type header.");
}

#[tokio::test]
async fn transfer_happy_path_and_history() {
    let srv = TestServer::spawn().await;
    let me = Client::new();
    let a = me.open_account(&srv, json!(1000)).await;
    let b = me.open_account(&srv, json!(500)).await;

    let res = me
        .post(srv.url("/transfers"))
        .header("X-Account-Identifier-Type", "id")
        .json(&json!({ "from_account": a["id"], "to_account": b["id"], "amount": 200 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Transfer successful");
    assert_eq!(body["transfer"]["amount"], "200.00");

    assert_eq!(me.balance(&srv, &a["id"]).await, "800.00");
    assert_eq!(me.balance(&srv, &b["id"]).await, "700.00");

    let res = me
        .get(srv.url(&format!(
            "/accounts/{}/transfers",
            a["account_number"].as_str().unwrap()
        )))
        .header("X-Account-Identifier-Type", "number")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let history: Vec<Value> = res.json().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["from_account_id"], a["id"]);
    assert_eq!(history[0]["to_account_id"], b["id"]);
}

#[tokio::test]
async fn transfer_by_account_number_with_decimal_amount() {
    let srv = TestServer::spawn().await;
    let me = Client::new();
    let a = me.open_account(&srv, json!("50.50")).await;
    let b = me.open_account(&srv, json!(0)).await;

    let res = me
        .post(srv.url("/transfers"))
        .header("X-Account-Identifier-Type", "number")
        .json(&json!({
            "from_account": a["account_number"],
            "to_account": b["account_number"],
            "amount": 10.25,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    assert_eq!(me.balance(&srv, &a["id"]).await, "40.25");
    assert_eq!(me.balance(&srv, &b["id"]).await, "10.25");
}

#[tokio::test]
async fn insufficient_funds_is_forbidden() {
    let srv = TestServer::spawn().await;
    let me = Client::new();
    let a = me.open_account(&srv, json!(100)).await;
    let b = me.open_account(&srv, json!(0)).await;

    let res = me
        .post(srv.url("/transfers"))
        .header("X-Account-Identifier-Type", "id")
        .json(&json!({ "from_account": a["id"], "to_account": b["id"], "amount": 200 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Insufficient funds");
    assert_eq!(me.balance(&srv, &a["id"]).await, "100.00");
}

#[tokio::test]
async fn transfer_validation_errors() {
    let srv = TestServer::spawn().await;
    let me = Client::new();
    let a = me.open_account(&srv, json!(100)).await;
    let b = me.open_account(&srv, json!(0)).await;

    let cases = [
        (json!({ "from_account": a["id"], "to_account": a["id"], "amount": 1 }), "to_account"),
        (json!({ "from_account": a["id"], "to_account": 999_999, "amount": 1 }), "to_account"),
        (json!({ "from_account": a["id"], "to_account": b["id"], "amount": 0 }), "amount"),
        (json!({ "from_account": a["id"], "to_account": b["id"], "amount": -5 }), "amount"),
        (json!({ "from_account": a["id"], "to_account": b["id"], "amount": "invalid_amount" }), "amount"),
        (json!({ "from_account": a["id"], "to_account": b["id"], "amount": 0.001 }), "amount"),
    ];

    for (body, field) in cases {
        let res = me
            .post(srv.url("/transfers"))
            .header("X-Account-Identifier-Type", "id")
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY, "body: {body}");
        let err: Value = res.json().await.unwrap();
        assert!(err["errors"][field].is_array(), "expected error on {field}: {err}");
    }

    assert_eq!(me.balance(&srv, &a["id"]).await, "100.00");
}

#[tokio::test]
async fn unknown_source_account_is_not_found() {
    let srv = TestServer::spawn().await;
    let me = Client::new();
    let b = me.open_account(&srv, json!(0)).await;

    let res = me
        .post(srv.url("/transfers"))
        .header("X-Account-Identifier-Type", "id")
        .json(&json!({ "from_account": 999_999, "to_account": b["id"], "amount": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Account not found.");
}

#[tokio::test]
async fn exponent_amounts_are_accepted() {
    let srv = TestServer::spawn().await;
    let me = Client::new();

    let res = me
        .post(srv.url("/accounts"))
        .header("Content-Type", "application/json")
        .body(r#"{ "initial_deposit": 1e16 }"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["account"]["balance"], "10000000000000000.00");
}

#[tokio::test]
async fn foreign_accounts_are_not_found() {
    let srv = TestServer::spawn().await;
    let alice = Client::new();
    let mallory = Client::new();
    let a = alice.open_account(&srv, json!(100)).await;
    let m = mallory.open_account(&srv, json!(0)).await;

    for path in [
        format!("/accounts/{}", a["id"]),
        format!("/accounts/{}/balance", a["id"]),
        format!("/accounts/{}/transfers", a["id"]),
    ] {
        let res = mallory
            .get(srv.url(&path))
            .header("X-Account-Identifier-Type", "id")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{path}");
    }

    let res = mallory
        .post(srv.url("/transfers"))
        .header("X-Account-Identifier-Type", "id")
        .json(&json!({ "from_account": a["id"], "to_account": m["id"], "amount": 50 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(alice.balance(&srv, &a["id"]).await, "100.00");
}

#[tokio::test]
async fn empty_history_is_an_empty_list() {
    let srv = TestServer::spawn().await;
    let me = Client::new();
    let a = me.open_account(&srv, json!(5)).await;

    let res = me
        .get(srv.url(&format!("/accounts/{}/transfers", a["id"])))
        .header("X-Account-Identifier-Type", "id")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn wrong_method_is_not_allowed() {
    let srv = TestServer::spawn().await;
    let me = Client::new();

    let res = me
        .get(srv.url("/transfers"))
        .header("X-Account-Identifier-Type", "id")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_overdraw_commits_once() {
    let srv = TestServer::spawn().await;
    let me = Client::new();
    let a = me.open_account(&srv, json!(1000)).await;
    let b = me.open_account(&srv, json!(0)).await;

    let send = || {
        me.post(srv.url("/transfers"))
            .header("X-Account-Identifier-Type", "id")
            .json(&json!({ "from_account": a["id"], "to_account": b["id"], "amount": 600 }))
            .send()
    };
    let (r1, r2) = tokio::join!(send(), send());
    let mut statuses = [r1.unwrap().status(), r2.unwrap().status()];
    statuses.sort();

    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::FORBIDDEN]);
    assert_eq!(me.balance(&srv, &a["id"]).await, "400.00");
    assert_eq!(me.balance(&srv, &b["id"]).await, "600.00");
}
