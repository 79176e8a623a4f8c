//! Shared harness for HTTP integration suites.
//!
//! Integration tests compile as separate crates under `backend/tests/`, so
//! the wiring of a full application over the in-memory store lives here.
//! Every request goes through the real routing table, extractor
//! configuration, trace middleware and domain services; only the Diesel
//! adapters are replaced.

#![expect(dead_code, reason = "each suite uses a different subset of helpers")]

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::test::{self as actix_test, TestRequest};
use actix_web::{App, web};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde_json::{Value, json};

use fixtrack::Trace;
use fixtrack::domain::{
    BootstrapService, InvitationCode, NewPassword, RoomName, SeedDefaults, Username,
};
use fixtrack::inbound::http::state::{HttpState, StateRepositories, StateServices};
use fixtrack::inbound::http::{json_config, path_config, query_config, routes};
use fixtrack::outbound::credentials::JwtSessionTokens;
use fixtrack::test_support::{InMemoryStore, MutableClock, PlaintextHasher};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const INVITATION_CODE: &str = "let-me-in";

/// Start instant shared by the suites: 10 March 2024, 09:00 UTC.
pub fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0)
        .single()
        .expect("valid instant")
}

/// One response, with the body parsed as JSON (`Null` when empty).
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

/// A seeded application over a fresh in-memory store.
pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<MutableClock>,
    state: HttpState,
}

impl TestApp {
    /// Seed the bootstrap admin, the default room and the invitation code.
    pub async fn seeded() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(MutableClock::new(start_instant()));
        let hasher = Arc::new(PlaintextHasher);

        BootstrapService::new(store.clone(), hasher.clone(), clock.clone())
            .seed_defaults(&SeedDefaults {
                admin_username: Username::new(ADMIN_USERNAME).expect("valid username"),
                admin_password: Some(NewPassword::new(ADMIN_PASSWORD).expect("valid password")),
                admin_email: None,
                room_name: RoomName::new("General").expect("valid room name"),
                invitation_code: InvitationCode::new(INVITATION_CODE).expect("valid code"),
            })
            .await
            .expect("seeding succeeds");

        let state = HttpState::assemble(
            StateRepositories {
                users: store.clone(),
                settings: store.clone(),
                rooms: store.clone(),
                items: store.clone(),
                strokes: store.clone(),
                periods: store.clone(),
            },
            StateServices::new(
                hasher,
                Arc::new(JwtSessionTokens::new(b"integration-secret")),
                clock.clone(),
            ),
        );
        Self {
            store,
            clock,
            state,
        }
    }

    /// Move the shared clock forward.
    pub fn advance(&self, delta: TimeDelta) {
        self.clock.advance(delta);
    }

    /// Send one request through a freshly initialised service.
    pub async fn send(&self, request: TestRequest) -> Reply {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(self.state.clone()))
                .app_data(json_config())
                .app_data(query_config())
                .app_data(path_config())
                .wrap(Trace)
                .service(web::scope("/api/v1").configure(routes)),
        )
        .await;
        let response = actix_test::call_service(&app, request.to_request()).await;
        let status = response.status();
        let bytes = actix_test::read_body(response).await;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };
        Reply { status, body }
    }

    /// Log in and return the bearer token.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let reply = self
            .send(
                TestRequest::post()
                    .uri("/api/v1/login")
                    .set_json(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "login failed: {}", reply.body);
        reply.body["token"]
            .as_str()
            .expect("token in login response")
            .to_owned()
    }

    /// Token for the seeded admin.
    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_USERNAME, ADMIN_PASSWORD).await
    }

    /// Register a member with the seeded invitation code and log them in.
    pub async fn member(&self, username: &str) -> (i64, String) {
        let password = format!("{username}-password");
        let reply = self
            .send(TestRequest::post().uri("/api/v1/register").set_json(json!({
                "username": username,
                "password": password,
                "invitationCode": INVITATION_CODE,
            })))
            .await;
        assert_eq!(
            reply.status,
            StatusCode::CREATED,
            "registration failed: {}",
            reply.body
        );
        let id = reply.body["id"].as_i64().expect("user id");
        (id, self.login(username, &password).await)
    }

    pub async fn get(&self, token: &str, uri: &str) -> Reply {
        self.send(authorised(TestRequest::get().uri(uri), token))
            .await
    }

    pub async fn post(&self, token: &str, uri: &str, body: Value) -> Reply {
        self.send(authorised(TestRequest::post().uri(uri), token).set_json(body))
            .await
    }

    pub async fn post_empty(&self, token: &str, uri: &str) -> Reply {
        self.send(authorised(TestRequest::post().uri(uri), token))
            .await
    }

    pub async fn put(&self, token: &str, uri: &str, body: Value) -> Reply {
        self.send(authorised(TestRequest::put().uri(uri), token).set_json(body))
            .await
    }

    pub async fn delete(&self, token: &str, uri: &str) -> Reply {
        self.send(authorised(TestRequest::delete().uri(uri), token))
            .await
    }

    /// Create a room and return its id.
    pub async fn create_room(&self, token: &str, name: &str) -> i64 {
        let reply = self
            .post(token, "/api/v1/rooms", json!({ "name": name }))
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.body["id"].as_i64().expect("room id")
    }

    /// Create an item and return its id.
    pub async fn create_item(&self, token: &str, room_id: i64, name: &str, price: f64) -> i64 {
        let reply = self
            .post(
                token,
                "/api/v1/items",
                json!({ "name": name, "roomId": room_id, "price": price }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.body["id"].as_i64().expect("item id")
    }
}

fn authorised(request: TestRequest, token: &str) -> TestRequest {
    request.insert_header((AUTHORIZATION, format!("Bearer {token}")))
}
