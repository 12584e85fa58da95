//! In-process Restful-Booker emulation on axum.
//!
//! Reproduces the status codes the real service answers with, including
//! `201 Created` for a successful delete and `405` for mutating a booking
//! that does not exist.

use std::collections::{BTreeMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::booking::{Booking, BookingId, BookingPatch, CreatedBooking};
use crate::config::Credentials;
use crate::result::AcceptorResult;

/// Live auth tokens kept by the stub; the oldest is revoked past this
const MAX_TOKENS: usize = 64;

#[derive(Debug, Default)]
struct Store {
    bookings: BTreeMap<u64, Booking>,
    next_id: u64,
    tokens: VecDeque<String>,
}

impl Store {
    fn issue_token(&mut self, token: String) {
        if self.tokens.len() == MAX_TOKENS {
            self.tokens.pop_front();
        }
        self.tokens.push_back(token);
    }

    fn accepts(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }
}

#[derive(Debug)]
struct StubState {
    credentials: Credentials,
    store: Mutex<Store>,
}

impl StubState {
    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let store = self.store();
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().strip_prefix("token="))
            .any(|token| store.accepts(token))
    }
}

type Shared = Arc<StubState>;

#[derive(Debug, Deserialize)]
struct AuthRequest {
    username: String,
    password: String,
}

/// Build the stub router for the given credentials
pub fn router(credentials: Credentials) -> Router {
    let state = Arc::new(StubState {
        credentials,
        store: Mutex::new(Store {
            next_id: 1,
            ..Store::default()
        }),
    });
    Router::new()
        .route("/auth", post(auth))
        .route("/ping", get(ping))
        .route("/booking", get(list_bookings).post(create_booking))
        .route(
            "/booking/{id}",
            get(get_booking)
                .put(update_booking)
                .patch(patch_booking)
                .delete(delete_booking),
        )
        .with_state(state)
}

fn text(status: StatusCode, body: &'static str) -> Response {
    (status, body).into_response()
}

fn parse_id(id: &str) -> Option<u64> {
    id.parse().ok()
}

async fn auth(State(state): State<Shared>, Json(request): Json<AuthRequest>) -> Response {
    if request.username == state.credentials.username
        && request.password == state.credentials.password
    {
        let token: String = uuid::Uuid::new_v4().simple().to_string().chars().take(15).collect();
        state.store().issue_token(token.clone());
        Json(json!({ "token": token })).into_response()
    } else {
        Json(json!({ "reason": "Bad credentials" })).into_response()
    }
}

async fn ping() -> Response {
    text(StatusCode::CREATED, "Created")
}

async fn list_bookings(State(state): State<Shared>) -> Response {
    let ids: Vec<BookingId> = state
        .store()
        .bookings
        .keys()
        .map(|&bookingid| BookingId { bookingid })
        .collect();
    Json(ids).into_response()
}

async fn create_booking(State(state): State<Shared>, Json(booking): Json<Booking>) -> Response {
    let mut store = state.store();
    let bookingid = store.next_id;
    store.next_id += 1;
    store.bookings.insert(bookingid, booking.clone());
    Json(CreatedBooking { bookingid, booking }).into_response()
}

async fn get_booking(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let store = state.store();
    match parse_id(&id).and_then(|id| store.bookings.get(&id)) {
        Some(booking) => Json(booking.clone()).into_response(),
        None => text(StatusCode::NOT_FOUND, "Not Found"),
    }
}

async fn update_booking(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(booking): Json<Booking>,
) -> Response {
    if !state.authorized(&headers) {
        return text(StatusCode::FORBIDDEN, "Forbidden");
    }
    let mut store = state.store();
    let existing = match parse_id(&id) {
        Some(id) => store.bookings.get_mut(&id),
        None => None,
    };
    match existing {
        Some(existing) => {
            *existing = booking.clone();
            Json(booking).into_response()
        }
        None => text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"),
    }
}

async fn patch_booking(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(patch): Json<BookingPatch>,
) -> Response {
    if !state.authorized(&headers) {
        return text(StatusCode::FORBIDDEN, "Forbidden");
    }
    let mut store = state.store();
    let existing = match parse_id(&id) {
        Some(id) => store.bookings.get_mut(&id),
        None => None,
    };
    match existing {
        Some(existing) => {
            patch.apply(existing);
            Json(existing.clone()).into_response()
        }
        None => text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"),
    }
}

async fn delete_booking(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !state.authorized(&headers) {
        return text(StatusCode::FORBIDDEN, "Forbidden");
    }
    let mut store = state.store();
    match parse_id(&id).and_then(|id| store.bookings.remove(&id)) {
        Some(_) => text(StatusCode::CREATED, "Created"),
        None => text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"),
    }
}

/// A running stub server; stops when dropped
#[derive(Debug)]
pub struct BookingStub {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl BookingStub {
    /// Serve on an ephemeral localhost port with the default credentials
    pub async fn spawn() -> AcceptorResult<Self> {
        Self::bind(SocketAddr::from(([127, 0, 0, 1], 0)), Credentials::default()).await
    }

    /// Serve on `addr` in a background task
    pub async fn bind(addr: SocketAddr, credentials: Credentials) -> AcceptorResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let app = router(credentials);
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!(error = %e, "booking stub stopped");
            }
        });
        info!(%addr, "booking stub listening");
        Ok(Self { addr, handle })
    }

    /// Serve on `addr` until the task is cancelled
    pub async fn serve(addr: SocketAddr, credentials: Credentials) -> AcceptorResult<()> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "booking stub listening");
        axum::serve(listener, router(credentials)).await?;
        Ok(())
    }

    /// Bound address
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL with trailing slash
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }
}

impl Drop for BookingStub {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
