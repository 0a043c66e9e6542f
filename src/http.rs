use crate::backend::BookingBackend;
use crate::error::{ApiError, StoreError};
use crate::token::{Claims, TokenService};
use crate::types::{DeleteResult, InsertResult, PriceOrder, Record, UpdateResult};
use crate::AppState;
use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, Path, Query, Request};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{extract::State, Extension, Json};
use axum::{
    routing::{get, patch, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ServicesQuery {
    sort: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct BookingsQuery {
    email: Option<String>,
}

/// A JSON request body. Requests that are not `application/json`, or carry
/// no body at all, read as an empty object. Only objects and arrays are
/// accepted at the top level.
#[derive(Debug)]
struct JsonBody(Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"));

        let body = Bytes::from_request(request, state)
            .await
            .map_err(|err| ApiError::MalformedBody(err.body_text()))?;

        let start = body.iter().copied().find(|byte| !byte.is_ascii_whitespace());
        match start {
            _ if !is_json => Ok(Self(Value::Object(Record::new()))),
            None => Ok(Self(Value::Object(Record::new()))),
            Some(b'{' | b'[') => serde_json::from_slice(&body)
                .map(Self)
                .map_err(|err| ApiError::MalformedBody(err.to_string())),
            Some(_) => Err(ApiError::MalformedBody(
                "top-level value must be an object or array".into(),
            )),
        }
    }
}

pub fn create_app<T: BookingBackend>(state: AppState<T>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Only listing bookings needs a token, creating one does not.
    let bookings = get(get_bookings::<T>)
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            verify_token,
        ))
        .post(add_booking::<T>);

    Router::new()
        .route("/", get(liveness))
        .route("/jwt", post(issue_token::<T>))
        .route("/services", get(get_services::<T>))
        .route("/services/:id", get(get_service::<T>))
        .route("/bookings", bookings)
        .route(
            "/bookings/:id",
            patch(update_booking_status::<T>).delete(remove_booking::<T>),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn start_server<T: BookingBackend>(
    listener: TcpListener,
    state: AppState<T>,
) -> std::io::Result<()> {
    axum::serve(listener, create_app(state)).await
}

/// Expects `Authorization: Bearer <token>`. Only the part after the first space
/// is looked at.
async fn verify_token(
    State(tokens): State<TokenService>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .filter(|value| !value.is_empty())
        .ok_or(ApiError::MissingCredentials)?;

    let token = authorization
        .to_str()
        .ok()
        .and_then(|value| value.split(' ').nth(1))
        .ok_or(ApiError::InvalidCredentials)?;

    let claims = tokens.verify(token).map_err(|err| {
        debug!(%err, "token verification failed");
        ApiError::InvalidCredentials
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// The token's `email` claim must be a string equal to the requested email.
/// A missing claim only matches a missing parameter, so a token carrying an
/// email is refused when no email is requested.
fn owns_bookings(claims: &Claims, email: Option<&str>) -> bool {
    match (claims.get("email"), email) {
        (None, None) => true,
        (Some(Value::String(claim)), Some(email)) => claim == email,
        _ => false,
    }
}

async fn liveness() -> &'static str {
    "car doctor server is running"
}

async fn issue_token<T: BookingBackend>(
    State(state): State<AppState<T>>,
    JsonBody(payload): JsonBody,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.tokens.issue(payload)?;
    Ok(Json(TokenResponse { token }))
}

async fn get_services<T: BookingBackend>(
    State(state): State<AppState<T>>,
    Query(query): Query<ServicesQuery>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let order = PriceOrder::from_query(query.sort.as_deref());
    Ok(Json(state.backend.services(order).await?))
}

async fn get_service<T: BookingBackend>(
    State(state): State<AppState<T>>,
    Path(id): Path<String>,
) -> Result<Json<Option<Record>>, ApiError> {
    Ok(Json(state.backend.service(&id).await?))
}

async fn get_bookings<T: BookingBackend>(
    State(state): State<AppState<T>>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<Record>>, ApiError> {
    if !owns_bookings(&claims, query.email.as_deref()) {
        return Err(ApiError::ForbiddenAccess);
    }

    let email = query.email.as_deref().filter(|email| !email.is_empty());
    Ok(Json(state.backend.bookings(email).await?))
}

async fn add_booking<T: BookingBackend>(
    State(state): State<AppState<T>>,
    JsonBody(booking): JsonBody,
) -> Result<Json<InsertResult>, ApiError> {
    let Value::Object(booking) = booking else {
        return Err(StoreError::Encoding("booking must be a JSON object".into()).into());
    };
    Ok(Json(state.backend.add_booking(booking).await?))
}

async fn update_booking_status<T: BookingBackend>(
    State(state): State<AppState<T>>,
    Path(id): Path<String>,
    JsonBody(update): JsonBody,
) -> Result<Json<UpdateResult>, ApiError> {
    let status = update.get("status").cloned().unwrap_or(Value::Null);
    Ok(Json(state.backend.update_booking_status(&id, status).await?))
}

async fn remove_booking<T: BookingBackend>(
    State(state): State<AppState<T>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    Ok(Json(state.backend.remove_booking(&id).await?))
}
