use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tfidf_recommender_core::{
    AnyGateway, ConfiguredVectorizer, DocumentKind, RankError, RecommendError, Recommendations,
    RecommendationsRequest, Recommender, VectorizeError, VectorizeJobRequest,
    VectorizeProblemRequest, VectorizeUserRequest, VectorizedEntity, VectorizedUser, Vectorizer,
};
use tokio::signal;
use tracing::{error, info, warn};

pub struct AppState {
    pub recommender: Recommender<AnyGateway, ConfiguredVectorizer>,
    pub persist_vectors: bool,
}

pub fn router(state: Arc<AppState>, cors: bool) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/vectorize_user", post(vectorize_user))
        .route("/vectorize_job", post(vectorize_job))
        .route("/vectorize_problem", post(vectorize_problem))
        .route("/recommendations", post(recommendations))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        );

    if cors {
        app = app.layer(tower_http::cors::CorsLayer::permissive());
    }

    app.with_state(state)
}

pub async fn serve(state: Arc<AppState>, bind: &str, cors: bool) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(address = %bind, "listening");
    axum::serve(listener, router(state, cors))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("shutdown signal received");
}

#[derive(Debug)]
struct HttpError(RecommendError);

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            RecommendError::Validation(_) => StatusCode::BAD_REQUEST,
            RecommendError::UserVectorNotFound { .. } => StatusCode::NOT_FOUND,
            RecommendError::InvalidVectorData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            RecommendError::Vectorize(VectorizeError::EmptyDocument) => StatusCode::BAD_REQUEST,
            RecommendError::Vectorize(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RecommendError::Rank(RankError::InvalidQueryVector(_)) => StatusCode::BAD_REQUEST,
            RecommendError::Rank(RankError::DimensionMismatch { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            RecommendError::Gateway(_) => StatusCode::BAD_GATEWAY,
        };

        if status.is_server_error() {
            error!("{:?}", self.0);
        } else {
            warn!(status = status.as_u16(), "{}", self.0);
        }

        (status, Json(json!({"error": self.0.to_string()}))).into_response()
    }
}

impl<E> From<E> for HttpError
where
    E: Into<RecommendError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Unwraps a JSON body, reporting unreadable bodies as validation failures.
fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, HttpError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| HttpError(RecommendError::Validation(rejection.body_text())))
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "mode": state.recommender.vectorizer().mode().to_string(),
    }))
}

async fn vectorize_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VectorizeUserRequest>, JsonRejection>,
) -> Result<Json<VectorizedUser>, HttpError> {
    let request = parse_body(payload)?;
    let result = state.recommender.vectorize_user(&request)?;
    if state.persist_vectors {
        state
            .recommender
            .store(DocumentKind::User, &result.user_id, &result.vector)
            .await?;
    }
    Ok(Json(result))
}

async fn vectorize_job(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VectorizeJobRequest>, JsonRejection>,
) -> Result<Json<VectorizedEntity>, HttpError> {
    let request = parse_body(payload)?;
    let result = state.recommender.vectorize_job(&request)?;
    if state.persist_vectors {
        state
            .recommender
            .store(DocumentKind::Job, &result.id, &result.vector)
            .await?;
    }
    Ok(Json(result))
}

async fn vectorize_problem(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VectorizeProblemRequest>, JsonRejection>,
) -> Result<Json<VectorizedEntity>, HttpError> {
    let request = parse_body(payload)?;
    let result = state.recommender.vectorize_problem(&request)?;
    if state.persist_vectors {
        state
            .recommender
            .store(DocumentKind::Problem, &result.id, &result.vector)
            .await?;
    }
    Ok(Json(result))
}

async fn recommendations(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RecommendationsRequest>, JsonRejection>,
) -> Result<Json<Recommendations>, HttpError> {
    let request = parse_body(payload)?;
    Ok(Json(state.recommender.recommendations(&request).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tfidf_recommender_core::{MemoryGateway, RecommendationOptions};
    use tower::ServiceExt;

    fn state(persist_vectors: bool) -> Arc<AppState> {
        Arc::new(AppState {
            recommender: Recommender::new(
                AnyGateway::Memory(MemoryGateway::new()),
                ConfiguredVectorizer::per_document().unwrap(),
                RecommendationOptions::default(),
            ),
            persist_vectors,
        })
    }

    async fn post_json(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn vectorize_user_returns_a_vector() {
        let app = router(state(false), false);
        let (status, body) = post_json(
            &app,
            "/vectorize_user",
            r#"{"user_id":"u1","bio":"Software engineer","profession":"developer"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], "u1");
        assert!(!body["vector"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_fields_are_bad_requests() {
        let app = router(state(false), false);
        let (status, body) = post_json(&app, "/vectorize_user", r#"{"user_id":"u1","bio":""}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("required"));

        let (status, _) = post_json(&app, "/recommendations", r#"{}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let app = router(state(false), false);
        let (status, body) = post_json(&app, "/vectorize_job", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let app = router(state(false), false);
        let (status, body) = post_json(&app, "/recommendations", r#"{"user_id":"missing"}"#).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("missing"));
    }

    #[tokio::test]
    async fn persisted_vectors_feed_recommendations() {
        let app = router(state(true), false);

        let (status, _) = post_json(
            &app,
            "/vectorize_user",
            r#"{"user_id":"u1","bio":"Rust","profession":"engineer"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = post_json(
            &app,
            "/vectorize_job",
            r#"{"job_id":1,"title":"Engineer","description":"Rust"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);

        let (status, _) = post_json(
            &app,
            "/vectorize_job",
            r#"{"id":2,"name":"Welder","description":"welding"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = post_json(&app, "/recommendations", r#"{"user_id":"u1"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], "u1");
        let jobs = body["top_job_recommendations"].as_array().unwrap();
        // per-document vectors are positional, so both two-term jobs score 1.0
        // and the tie keeps storage order
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0][0], 1);
        assert!((jobs[0][1].as_f64().unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(jobs[1][0], 2);
        assert!(body["top_problem_recommendations"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mismatched_vocabularies_are_reported() {
        let app = router(state(true), false);
        post_json(
            &app,
            "/vectorize_user",
            r#"{"user_id":"u1","bio":"Rust","profession":"engineer"}"#,
        )
        .await;
        post_json(
            &app,
            "/vectorize_problem",
            r#"{"problem_id":"p1","name":"Leaking pipe","description":"kitchen sink"}"#,
        )
        .await;

        let (status, _) = post_json(&app, "/recommendations", r#"{"user_id":"u1"}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn health_reports_mode() {
        let app = router(state(false), false);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["mode"], "per-document");
    }
}
