//! In-process fake of the Finca Platanera API for integration tests.
//!
//! The fake issues `A1`/`R1` on login, rotates to `A2` on refresh, and guards
//! `workers/` behind the current access token. `echo-headers/` reflects the
//! headers a request arrived with. Tests flip the switches on
//! [`FakeApi`] to simulate server-side expiry and refresh rejection.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use actix_web::{App, HttpRequest, HttpResponse, HttpServer, http::header, web};
use serde_json::{Value, json};
use url::Url;

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "secret";

/// Shared, mutable state behind the fake endpoints.
#[derive(Debug)]
pub struct FakeApi {
    valid_access: Mutex<String>,
    refresh_allowed: AtomicBool,
    refresh_calls: AtomicUsize,
    protected_calls: AtomicUsize,
}

impl FakeApi {
    fn new() -> Self {
        Self {
            valid_access: Mutex::new("A1".to_owned()),
            refresh_allowed: AtomicBool::new(true),
            refresh_calls: AtomicUsize::new(0),
            protected_calls: AtomicUsize::new(0),
        }
    }

    /// Invalidate whatever access token the client currently holds.
    pub fn expire_access_token(&self) {
        *self.valid_access.lock().expect("fake api lock") = "revoked".to_owned();
    }

    /// Make every subsequent refresh attempt fail with 401.
    pub fn reject_refresh(&self) {
        self.refresh_allowed.store(false, Ordering::SeqCst);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn protected_calls(&self) -> usize {
        self.protected_calls.load(Ordering::SeqCst)
    }

    fn is_authorised(&self, request: &HttpRequest) -> bool {
        let expected = format!(
            "Bearer {}",
            self.valid_access.lock().expect("fake api lock")
        );
        request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            == Some(expected.as_str())
    }
}

/// Running fake server, torn down with the surrounding actix system.
pub struct FakeServer {
    pub base_url: Url,
    pub api: Arc<FakeApi>,
}

/// Start the fake API on an ephemeral port. Must run inside an actix system.
pub fn start_fake_api() -> FakeServer {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr: SocketAddr = listener.local_addr().expect("listener addr");
    let api = Arc::new(FakeApi::new());
    let state = web::Data::from(Arc::clone(&api));

    let server = HttpServer::new(move || {
        App::new().app_data(state.clone()).service(
            web::scope("/api")
                .route("/auth/login/", web::post().to(login))
                .route("/auth/refresh/", web::post().to(refresh))
                .route("/health/", web::get().to(health))
                .route("/echo-headers/", web::get().to(echo_headers))
                .route("/workers/", web::get().to(list_workers))
                .route("/workers/", web::post().to(create_worker)),
        )
    })
    .workers(1)
    .listen(listener)
    .expect("bind test server")
    .disable_signals()
    .run();
    actix_web::rt::spawn(server);

    FakeServer {
        base_url: Url::parse(&format!("http://{addr}/api")).expect("fake api url"),
        api,
    }
}

async fn login(body: web::Json<Value>) -> HttpResponse {
    if body["username"] == USERNAME && body["password"] == PASSWORD {
        HttpResponse::Ok().json(json!({ "access": "A1", "refresh": "R1" }))
    } else {
        HttpResponse::Unauthorized().json(json!({ "detail": "Invalid credentials" }))
    }
}

async fn refresh(api: web::Data<FakeApi>, body: web::Json<Value>) -> HttpResponse {
    api.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if !api.refresh_allowed.load(Ordering::SeqCst) || body["refresh"] != "R1" {
        return HttpResponse::Unauthorized()
            .json(json!({ "detail": "Token is invalid or expired" }));
    }
    *api.valid_access.lock().expect("fake api lock") = "A2".to_owned();
    HttpResponse::Ok().json(json!({ "access": "A2" }))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok", "message": "API funcionando" }))
}

async fn echo_headers(request: HttpRequest) -> HttpResponse {
    let joined = |name: header::HeaderName| {
        request
            .headers()
            .get_all(name)
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join(", ")
    };
    HttpResponse::Ok().json(json!({
        "accept_language": joined(header::ACCEPT_LANGUAGE),
        "authorization": joined(header::AUTHORIZATION),
    }))
}

async fn list_workers(api: web::Data<FakeApi>, request: HttpRequest) -> HttpResponse {
    api.protected_calls.fetch_add(1, Ordering::SeqCst);
    if !api.is_authorised(&request) {
        return HttpResponse::Unauthorized().json(json!({ "detail": "Not authenticated" }));
    }
    HttpResponse::Ok().json(json!([{ "id": 1, "name": "Lucía" }]))
}

async fn create_worker(
    api: web::Data<FakeApi>,
    request: HttpRequest,
    body: web::Json<Value>,
) -> HttpResponse {
    api.protected_calls.fetch_add(1, Ordering::SeqCst);
    if !api.is_authorised(&request) {
        return HttpResponse::Unauthorized().json(json!({ "detail": "Not authenticated" }));
    }
    if body.get("name").and_then(Value::as_str).is_none() {
        return HttpResponse::BadRequest().json(json!({ "name": ["This field is required."] }));
    }
    HttpResponse::Created().json(json!({ "id": 2, "name": body["name"] }))
}
