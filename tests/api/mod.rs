//! Shared harness: the real server wired to in-memory collaborators

#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use authcore::auth::{AccountService, TokenKeys, TokenService};
use authcore::repository::{InMemoryAccountRepository, InMemoryRevocationStore};
use authcore::startup::run;
use serde_json::{json, Value};

pub const PRIVATE_PEM: &[u8] = include_bytes!("../../config/rsa_private_test.pem");
pub const PUBLIC_PEM: &[u8] = include_bytes!("../../config/rsa_public_test.pem");
pub const REFRESH_SECRET: &str = "anotsorandomtestsecret-at-least-32-bytes";
pub const ACCESS_EXPIRY: i64 = 15 * 60;
pub const REFRESH_EXPIRY: i64 = 3 * 24 * 3600;

pub struct TestApp {
    pub address: String,
    pub accounts: Arc<InMemoryAccountRepository>,
    pub store: Arc<InMemoryRevocationStore>,
    pub client: reqwest::Client,
}

pub fn test_keys() -> TokenKeys {
    TokenKeys::from_pem(PRIVATE_PEM, PUBLIC_PEM, REFRESH_SECRET).expect("Failed to load test keys")
}

pub fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let accounts = Arc::new(InMemoryAccountRepository::new());
    let store = Arc::new(InMemoryRevocationStore::new());

    let account_service = AccountService::new(accounts.clone());
    let token_service = TokenService::new(store.clone(), test_keys(), ACCESS_EXPIRY, REFRESH_EXPIRY);

    let server = run(listener, account_service, token_service).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        accounts,
        store,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/account{}", self.address, path)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(&self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn signup(&self, email: &str, password: &str) -> reqwest::Response {
        self.post_json("/signup", &json!({ "email": email, "password": password }))
            .await
    }

    pub async fn signin(&self, email: &str, password: &str) -> reqwest::Response {
        self.post_json("/signin", &json!({ "email": email, "password": password }))
            .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> reqwest::Response {
        self.post_json("/tokens", &json!({ "refresh_token": refresh_token }))
            .await
    }

    pub async fn get_me(&self, access_token: &str) -> reqwest::Response {
        self.client
            .get(&self.url("/me"))
            .bearer_auth(access_token)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}
