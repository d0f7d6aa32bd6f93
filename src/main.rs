//! Tray Order Sheet - order sheet service fed by AI product extraction

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use tray_order_sheet::domain::order::OrderSheetError;
use tray_order_sheet::{
    prepare_context, AppError, Config, Extractor, OrderItemView, OrderSheet, OrderSheetView,
    PageFetcher, ProductData,
};

#[derive(Clone)]
pub struct AppState {
    pub sheet: Arc<RwLock<OrderSheet>>,
    pub fetcher: Arc<PageFetcher>,
    pub extractor: Arc<Extractor>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    if config.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY ausente; a extração de produtos ficará indisponível");
    }
    let state = AppState {
        sheet: Arc::new(RwLock::new(OrderSheet::new())),
        fetcher: Arc::new(PageFetcher::new()?),
        extractor: Arc::new(Extractor::from_config(&config)?),
    };

    let app = router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Tray Order Sheet listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({"status": "healthy", "service": "tray-order-sheet"})) }),
        )
        .route("/api/v1/order", get(get_order).delete(reset_order))
        .route("/api/v1/order/items", post(add_item))
        .route("/api/v1/order/items/:id", delete(remove_item))
        .route("/api/v1/order/items/:id/quantity", put(set_quantity))
        .route("/api/v1/order/export", get(export_order))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, serde::Deserialize)]
pub struct AddItemRequest {
    pub url: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct SetQuantityRequest {
    pub sku: String,
    pub quantity: String,
}

/// Fetch → prepare → extract → append. The three awaits run strictly in
/// sequence; the sheet lock is only taken after the extraction completed.
async fn add_item(
    State(s): State<AppState>,
    Json(r): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<OrderItemView>), AppError> {
    let url = r.url.trim().to_string();
    if url.is_empty() {
        return Err(AppError::InvalidUrl);
    }

    let html = s.fetcher.fetch(&url).await?;
    let context = prepare_context(&html);
    let data = s.extractor.extract(&context).await?;
    tracing::info!(nome = %data.nome, variacoes = data.variacoes.len(), "produto extraído");

    let mut sheet = s.sheet.write().await;
    let item = sheet.add(url, data);
    Ok((
        StatusCode::CREATED,
        Json(OrderItemView {
            id: item.id,
            source_url: item.source_url,
            extracted_at: item.extracted_at,
            data: item.data,
            quantities: Default::default(),
        }),
    ))
}

async fn get_order(State(s): State<AppState>) -> Json<OrderSheetView> {
    Json(s.sheet.read().await.snapshot())
}

async fn remove_item(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    s.sheet.write().await.remove(id).map_err(sheet_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_quantity(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<SetQuantityRequest>,
) -> Result<StatusCode, AppError> {
    s.sheet
        .write()
        .await
        .set_quantity(id, r.sku, r.quantity)
        .map_err(sheet_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reset_order(State(s): State<AppState>) -> StatusCode {
    s.sheet.write().await.clear();
    StatusCode::NO_CONTENT
}

async fn export_order(State(s): State<AppState>) -> Json<Vec<ProductData>> {
    Json(s.sheet.read().await.export())
}

fn sheet_error(e: OrderSheetError) -> AppError {
    match e {
        OrderSheetError::ItemNotFound => AppError::ItemNotFound,
    }
}
