//! Structured product extraction via the Gemini generateContent API
//!
//! The extraction intelligence lives in the external model; this module only
//! supplies the prompt, a strict response schema, and defensive parsing of
//! the candidate text. Exactly one attempt is made per call, no retry.

use serde_json::{json, Value};

use crate::domain::product::ProductData;
use crate::{AppError, Config};

const GENERATE_CONTENT_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const SYSTEM_INSTRUCTION: &str = r#"
Atue como um especialista em extração de dados da plataforma Tray Commerce.
Sua tarefa é CORRELACIONAR dados visuais (HTML) com dados técnicos (JSON de Script) para garantir precisão absoluta no estoque.

ALGORITMO DE EXTRAÇÃO (IMPORTANTE):

1. **IDENTIFIQUE O MAPA DE IDs (HTML)**:
   - Procure no HTML por elementos de seleção de variação (dropdowns <select> ou botões/links).
   - Identifique o NOME do tamanho (ex: "P", "M") e o ID numérico associado (geralmente em atributos como 'value', 'data-id', 'rel', ou 'data-variation-id').
   - *Exemplo Mental*: Encontrei <a data-id="542">Tamanho P</a>. Logo, P = 542.

2. **CONSULTE O ESTOQUE REAL (SCRIPT JSON)**:
   - Vá até o final do código, nos scripts, e encontre a variável 'skuJson' ou 'Tray.Product'.
   - Este objeto usa os IDs numéricos como chave.
   - *Exemplo Mental*: No skuJson, a chave "542" tem { "stock": 10, "reference": "REF-P" }.

3. **CRUZE OS DADOS**:
   - Tamanho P (ID 542) -> JSON ID 542 -> Estoque 10.
   - Se você apenas ler o JSON sem cruzar com o HTML, não saberá qual ID pertence a qual Tamanho. FAÇA O CRUZAMENTO.

4. **REGRAS DE DADOS**:
   - Nome: Use o <h1> principal.
   - Referência Pai: Procure próximo ao preço ou nome.
   - Imagem: URL completa.
   - Se 'skuJson' não existir, procure atributos 'data-stock' diretamente nas tags HTML.

Seja extremamente preciso com os números. Não alucine estoques.
"#;

const USER_PREFIX: &str = "Analise este código fonte de loja Tray. CRUZE o ID do HTML com o skuJson para garantir o estoque correto de cada tamanho:";

/// Response schema constraining the model to the `ProductData` wire shape.
fn product_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "tipo": {
                "type": "string",
                "enum": ["simples", "composicao", "desconhecido"],
                "description": "Identifica se o produto é 'simples' (item único com variações de tamanho) ou 'composicao' (kit/conjunto)."
            },
            "nome": {
                "type": "string",
                "description": "Nome completo do produto extraído do HTML."
            },
            "imagem": {
                "type": "string",
                "description": "URL da imagem principal do produto (ex: og:image ou imagem da galeria)."
            },
            "referenciaPai": {
                "type": "string",
                "description": "Código de referência (SKU) do produto pai."
            },
            "variacoes": {
                "type": "array",
                "description": "Lista de variações de tamanho, suas referências e estoque.",
                "items": {
                    "type": "object",
                    "properties": {
                        "tamanho": {
                            "type": "string",
                            "description": "Rótulo do tamanho (ex: P, M, G, PPP, 38, 40)."
                        },
                        "referencia": {
                            "type": "string",
                            "description": "Código SKU/Referência específico desta variação."
                        },
                        "estoque": {
                            "type": "integer",
                            "description": "Quantidade exata em estoque no skuJson/data-stock. Retorne 0 se esgotado."
                        }
                    },
                    "required": ["tamanho", "referencia"]
                }
            }
        },
        "required": ["tipo", "nome", "variacoes"]
    })
}

pub struct Extractor {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl Extractor {
    pub fn from_config(cfg: &Config) -> crate::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            api_key: cfg.gemini_api_key.clone(),
            model: cfg.gemini_model.clone(),
            base_url: GENERATE_CONTENT_URL.to_string(),
        })
    }

    /// Extracts one `ProductData` record from already-prepared HTML.
    ///
    /// Fails before any network call when the API key is missing. The schema
    /// constrains the model output, so the candidate text is deserialized
    /// directly without client-side re-validation.
    pub async fn extract(&self, context: &str) -> crate::Result<ProductData> {
        let api_key = self.api_key.as_deref().ok_or(AppError::MissingApiKey)?;

        let payload = json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{
                "role": "user",
                "parts": [{ "text": format!("{USER_PREFIX}\n\n{context}") }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": product_schema(),
                "temperature": 0
            }
        });

        // The key travels in a header, never in the URL: reqwest errors
        // render the URL, and that string reaches logs and error bodies.
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(provider_message(status.as_u16(), &body)));
        }
        let body: Value = response.json().await?;

        let text = candidate_text(&body).ok_or(AppError::EmptyModelResponse)?;
        let data: ProductData = serde_json::from_str(strip_code_fences(&text))?;
        Ok(data)
    }
}

/// Surfaced failure text for a non-success provider status. Gemini error
/// bodies are JSON `{"error": {"message": ...}}`; fall back to the raw body,
/// or to the bare status when the body is empty.
fn provider_message(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.get("error")?
            .get("message")?
            .as_str()
            .map(|s| s.to_string())
    });
    match detail {
        Some(message) => format!("status {status}: {message}"),
        None if body.trim().is_empty() => format!("status {status}"),
        None => format!("status {status}: {}", body.trim()),
    }
}

/// Text of the first candidate part, if the model produced one.
fn candidate_text(body: &Value) -> Option<String> {
    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Gemini occasionally wraps JSON output in markdown fences even with a
/// response schema set; strip them before parsing.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}
