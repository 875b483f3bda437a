use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use decarbonator_core::{PlantError, PlantService};
use decarbonator_db::models::{DeleteConfirmation, NewPlant, Plant, PlantUpdate};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl From<PlantError> for AppError {
    fn from(err: PlantError) -> Self {
        let status = match err {
            PlantError::NotFound => StatusCode::NOT_FOUND,
            PlantError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "detail": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(service: PlantService) -> Router {
    Router::new()
        .route("/plants", get(list_plants).post(create_plant))
        .route("/plants/", get(list_plants).post(create_plant))
        .route(
            "/plants/{id}",
            get(get_plant).put(update_plant).delete(delete_plant),
        )
        .layer(CorsLayer::permissive())
        .with_state(service)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(service: PlantService, bind: &str, port: u16) -> Result<()> {
    let app = build_router(service);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("decarbonator serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("decarbonator serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn create_plant(
    State(service): State<PlantService>,
    payload: Result<Json<NewPlant>, JsonRejection>,
) -> Result<Json<Plant>, AppError> {
    let Json(input) = payload?;
    Ok(Json(service.create(input).await?))
}

async fn list_plants(State(service): State<PlantService>) -> Result<Json<Vec<Plant>>, AppError> {
    Ok(Json(service.list_all().await?))
}

async fn get_plant(
    State(service): State<PlantService>,
    Path(id): Path<String>,
) -> Result<Json<Plant>, AppError> {
    Ok(Json(service.get(&id).await?))
}

async fn update_plant(
    State(service): State<PlantService>,
    Path(id): Path<String>,
    payload: Result<Json<PlantUpdate>, JsonRejection>,
) -> Result<Json<Plant>, AppError> {
    let Json(update) = payload?;
    Ok(Json(service.update(&id, update).await?))
}

async fn delete_plant(
    State(service): State<PlantService>,
    Path(id): Path<String>,
) -> Result<Json<DeleteConfirmation>, AppError> {
    Ok(Json(service.delete(&id).await?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use chrono::{DateTime, Utc};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use decarbonator_core::PlantService;
    use decarbonator_db::memory::MemoryPlantStore;
    use decarbonator_db::models::{PlantDocument, PlantId, PlantUpdate};
    use decarbonator_db::queries::plants::MongoPlantStore;
    use decarbonator_db::store::PlantStore;
    use decarbonator_test_utils::{create_test_db, drop_test_db};

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    fn memory_service() -> PlantService {
        PlantService::new(Arc::new(MemoryPlantStore::new()))
    }

    async fn send(
        service: PlantService,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let app = super::build_router(service);
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        app.oneshot(request).await.unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create_fern(service: &PlantService) -> Value {
        let resp = send(
            service.clone(),
            Method::POST,
            "/plants/",
            Some(json!({ "name": "Fern", "species": "Boston Fern" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        body_json(resp).await
    }

    struct UnreachableStore;

    #[async_trait]
    impl PlantStore for UnreachableStore {
        async fn insert(&self, _doc: PlantDocument) -> Result<PlantId> {
            anyhow::bail!("connection refused")
        }

        async fn find_all(&self) -> Result<Vec<PlantDocument>> {
            anyhow::bail!("connection refused")
        }

        async fn find_by_id(&self, _id: &PlantId) -> Result<Option<PlantDocument>> {
            anyhow::bail!("connection refused")
        }

        async fn update_by_id(
            &self,
            _id: &PlantId,
            _update: &PlantUpdate,
            _now: DateTime<Utc>,
        ) -> Result<u64> {
            anyhow::bail!("connection refused")
        }

        async fn delete_by_id(&self, _id: &PlantId) -> Result<u64> {
            anyhow::bail!("connection refused")
        }
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_plant_applies_defaults() {
        let service = memory_service();

        let json = create_fern(&service).await;
        assert_eq!(json["name"], "Fern");
        assert_eq!(json["species"], "Boston Fern");
        assert_eq!(json["status"], "offline");
        assert_eq!(json["health"], "Unknown");
        assert_eq!(json["water"], "Not watered yet");
        assert_eq!(json["age_months"], 0);
        assert_eq!(json["created_at"], json["updated_at"]);
        assert!(json["id"].is_string(), "id should be a plain string");
        assert!(json.get("_id").is_none());
    }

    #[tokio::test]
    async fn test_create_plant_without_trailing_slash() {
        let service = memory_service();

        let resp = send(
            service,
            Method::POST,
            "/plants",
            Some(json!({ "name": "Ivy", "species": "Hedera helix", "age_months": 5 })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["age_months"], 5);
    }

    #[tokio::test]
    async fn test_create_plant_missing_required_field_is_rejected() {
        let service = memory_service();

        let resp = send(
            service.clone(),
            Method::POST,
            "/plants/",
            Some(json!({ "name": "Nameless" })),
        )
        .await;
        assert!(resp.status().is_client_error(), "got {}", resp.status());

        let resp = send(service, Method::GET, "/plants/", None).await;
        assert_eq!(body_json(resp).await, json!([]));
    }

    #[tokio::test]
    async fn test_rejected_bodies_use_detail_payload() {
        let service = memory_service();

        let resp = send(
            service.clone(),
            Method::POST,
            "/plants/",
            Some(json!({ "name": "x" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(resp).await;
        let detail = json["detail"].as_str().expect("detail should be a string");
        assert!(detail.contains("species"), "unexpected detail: {detail}");

        let app = super::build_router(service.clone());
        let resp = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/plants/")
                    .header("content-type", "application/json")
                    .body(Body::from("{"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await["detail"].is_string());

        let created = create_fern(&service).await;
        let id = created["id"].as_str().unwrap();
        let resp = send(
            service,
            Method::PUT,
            &format!("/plants/{id}"),
            Some(json!({ "age_months": "old" })),
        )
        .await;
        assert!(resp.status().is_client_error(), "got {}", resp.status());
        assert!(body_json(resp).await["detail"].is_string());
    }

    #[tokio::test]
    async fn test_delete_echoes_id_as_sent() {
        let service = memory_service();
        let created = create_fern(&service).await;
        let upper = created["id"].as_str().unwrap().to_uppercase();

        let resp = send(service, Method::DELETE, &format!("/plants/{upper}"), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["id"], upper);
    }

    #[tokio::test]
    async fn test_list_plants_empty() {
        let resp = send(memory_service(), Method::GET, "/plants/", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!([]));
    }

    #[tokio::test]
    async fn test_list_plants_with_data() {
        let service = memory_service();
        create_fern(&service).await;
        create_fern(&service).await;

        let resp = send(service, Method::GET, "/plants", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let arr = json.as_array().expect("response should be an array");
        assert_eq!(arr.len(), 2);
        assert_ne!(arr[0]["id"], arr[1]["id"]);
    }

    #[tokio::test]
    async fn test_get_plant() {
        let service = memory_service();
        let created = create_fern(&service).await;
        let id = created["id"].as_str().unwrap();

        let resp = send(service, Method::GET, &format!("/plants/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, created);
    }

    #[tokio::test]
    async fn test_get_plant_not_found() {
        let random_id = PlantId::generate();
        let resp = send(
            memory_service(),
            Method::GET,
            &format!("/plants/{random_id}"),
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await, json!({ "detail": "Plant not found" }));
    }

    #[tokio::test]
    async fn test_malformed_id_is_not_found() {
        let service = memory_service();

        let resp = send(service.clone(), Method::GET, "/plants/not-an-id", None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(
            service.clone(),
            Method::PUT,
            "/plants/not-an-id",
            Some(json!({ "health": "Good" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(service, Method::DELETE, "/plants/not-an-id", None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_plant_is_partial() {
        let service = memory_service();
        let created = create_fern(&service).await;
        let id = created["id"].as_str().unwrap();

        let resp = send(
            service,
            Method::PUT,
            &format!("/plants/{id}"),
            Some(json!({ "health": "Good", "water": null })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["id"], created["id"]);
        assert_eq!(json["health"], "Good");
        assert_eq!(json["water"], created["water"]);
        assert_eq!(json["name"], "Fern");
        assert_eq!(json["species"], "Boston Fern");
        assert_eq!(json["created_at"], created["created_at"]);
    }

    #[tokio::test]
    async fn test_update_plant_not_found() {
        let random_id = PlantId::generate();
        let resp = send(
            memory_service(),
            Method::PUT,
            &format!("/plants/{random_id}"),
            Some(json!({ "health": "Good" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_plant() {
        let service = memory_service();
        let created = create_fern(&service).await;
        let id = created["id"].as_str().unwrap();

        let resp = send(service.clone(), Method::DELETE, &format!("/plants/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!({ "message": "Plant deleted successfully", "id": id })
        );

        let resp = send(service.clone(), Method::GET, &format!("/plants/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(service, Method::DELETE, &format!("/plants/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_store_fault_is_internal_error() {
        let service = PlantService::new(Arc::new(UnreachableStore));

        let resp = send(service.clone(), Method::GET, "/plants/", None).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        let detail = json["detail"].as_str().unwrap();
        assert!(
            detail.starts_with("Error getting plants: "),
            "unexpected detail: {detail}"
        );
        assert!(detail.contains("connection refused"));

        let resp = send(
            service,
            Method::POST,
            "/plants/",
            Some(json!({ "name": "Fern", "species": "Boston Fern" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_full_lifecycle_against_mongo() {
        let (db, _name) = create_test_db().await;
        let service = PlantService::new(Arc::new(MongoPlantStore::new(&db)));

        let created = create_fern(&service).await;
        let id = created["id"].as_str().unwrap();

        let resp = send(service.clone(), Method::GET, &format!("/plants/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, created);

        let resp = send(
            service.clone(),
            Method::PUT,
            &format!("/plants/{id}"),
            Some(json!({ "status": "online", "age_months": 2 })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let updated = body_json(resp).await;
        assert_eq!(updated["status"], "online");
        assert_eq!(updated["age_months"], 2);
        assert_eq!(updated["health"], "Unknown");

        let resp = send(service.clone(), Method::DELETE, &format!("/plants/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = send(service, Method::GET, "/plants/", None).await;
        assert_eq!(body_json(resp).await, json!([]));

        drop_test_db(&db).await;
    }
}
