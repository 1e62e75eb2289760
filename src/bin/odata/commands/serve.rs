//! Runs a local server that builds requests for the current context.
//!
//! Browser tools can't easily reuse the CLI, so the same operations are exposed over HTTP. Nothing
//! is forwarded to the OData endpoint, the server only builds URLs and filters.
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{info, warn};
use rusty_odata::context::Context;
use rusty_odata::engine::LooseFilter;
use rusty_odata::request::EntityQueryInput;
use rusty_odata::{
    compile_filter, EntityQuery, Error, FilterError, InternalError, Request, RequestHelper,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::runtime::Builder;
use tower_http::cors::CorsLayer;

struct ServerState {
    helper: RequestHelper,
    url_base: String,
    /// Paging defaults for requests that don't set their own.
    defaults: EntityQuery,
}

#[derive(Serialize)]
struct CompiledFilter {
    filter: String,
}

/// Every error is the caller's fault, so they all turn into a 400 with the message as body.
struct ApiError(String);

impl From<FilterError> for ApiError {
    fn from(value: FilterError) -> Self {
        ApiError(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!("Rejected request: {}", self.0);
        (StatusCode::BAD_REQUEST, self.0).into_response()
    }
}

pub fn run(bind: &str, allow_origin: Option<String>) -> Result<(), Error> {
    let context = Context::current()?;
    info!("Serving requests for context {}", context.name);

    let state = Arc::new(ServerState {
        helper: RequestHelper::from_context(&context),
        defaults: EntityQuery::new("")
            .page(context.page_size, 0)
            .skip_tokens(context.use_skip_tokens),
        url_base: context.url_base,
    });

    let mut app = Router::new()
        .route("/api/v1/connection", get(|| async { "OK" }))
        .route("/api/v1/request", post(build_request))
        .route("/api/v1/filter", post(build_filter))
        .with_state(state);

    if let Some(origin) = allow_origin {
        let origin = origin
            .parse::<HeaderValue>()
            .map_err(|_| InternalError(format!("'{origin}' is not a valid origin")))?;

        app = app.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_headers([header::CONTENT_TYPE])
                .allow_methods([Method::GET, Method::POST]),
        );
    }

    // A single thread is plenty for a server that only ever talks to one local user.
    let tokio = Builder::new_current_thread().enable_io().build()?;

    tokio.block_on(async {
        let listener = tokio::net::TcpListener::bind(bind).await?;
        println!("Listening on http://{bind}");

        axum::serve(listener, app).await
    })?;

    Ok(())
}

async fn build_request(
    State(state): State<Arc<ServerState>>,
    Json(input): Json<EntityQueryInput>,
) -> Result<Json<Request>, ApiError> {
    let query = input.into_query(state.helper.options(), &state.defaults)?;

    Ok(Json(state.helper.entity_request(&state.url_base, &query)?))
}

async fn build_filter(
    State(state): State<Arc<ServerState>>,
    Json(filters): Json<Vec<LooseFilter>>,
) -> Result<Json<CompiledFilter>, ApiError> {
    let options = state.helper.options();
    let filters = LooseFilter::convert_all(filters, options)?;

    Ok(Json(CompiledFilter {
        filter: compile_filter(&filters, options)?,
    }))
}
