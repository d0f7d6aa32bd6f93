//! Tray Order Sheet
//!
//! Self-hosted order sheet builder for Tray Commerce stores.
//!
//! ## Features
//! - Product page fetch through public CORS proxies with fallback
//! - HTML context preparation (noise stripping + head/tail truncation)
//! - Structured extraction via the Gemini generateContent API
//! - In-memory order sheet with per-variation quantities

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

pub mod config;
pub mod context;
pub mod domain;
pub mod extract;
pub mod fetch;

pub use config::Config;
pub use context::prepare_context;
pub use domain::order::{OrderItemView, OrderSheet, OrderSheetView};
pub use domain::product::{ProductData, ProductType, Variation};
pub use extract::Extractor;
pub use fetch::PageFetcher;

// =============================================================================
// Error Types
// =============================================================================

/// Top-level failure taxonomy. User-facing messages are Portuguese, matching
/// the store operators this tool serves; diagnostics go through `tracing`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Formato de URL inválido.")]
    InvalidUrl,

    #[error("O site demorou para responder (20s).")]
    FetchTimeout,

    #[error("Proxy retornou status: {0}")]
    ProxyStatus(u16),

    #[error("O conteúdo retornado parece vazio.")]
    EmptyBody,

    #[error("Falha ao acessar a URL. Verifique se o link está correto.")]
    FetchExhausted,

    #[error("Chave de API ausente. Verifique a configuração do ambiente.")]
    MissingApiKey,

    #[error("Nenhuma resposta gerada pelo modelo.")]
    EmptyModelResponse,

    #[error("Falha na chamada ao modelo: {0}")]
    Provider(String),

    #[error("Resposta do modelo inválida: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("Falha na comunicação: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Produto não encontrado no pedido.")]
    ItemNotFound,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidUrl => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ItemNotFound => StatusCode::NOT_FOUND,
            Self::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            Self::FetchTimeout
            | Self::ProxyStatus(_)
            | Self::EmptyBody
            | Self::FetchExhausted
            | Self::EmptyModelResponse
            | Self::Provider(_)
            | Self::MalformedResponse(_)
            | Self::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
