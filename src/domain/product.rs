//! Extracted product record
//!
//! Wire shape of one extraction call. Field names are the Portuguese ones
//! the Gemini response schema constrains, so the model output deserializes
//! directly into these types with no mapping layer.

use serde::{Deserialize, Serialize};

/// Product classification, set only by the extraction result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    /// Single item with size variations.
    Simples,
    /// Kit/bundle product.
    Composicao,
    /// Extraction could not classify.
    #[default]
    Desconhecido,
}

/// One purchasable size/SKU combination.
///
/// `estoque = None` means unknown; the extraction prompt asks for `0` when
/// the page confirms the size is out of stock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    pub tamanho: String,
    pub referencia: String,
    #[serde(default)]
    pub estoque: Option<i64>,
}

/// Product record produced wholesale by one extraction call. Immutable once
/// appended to the order sheet, except for removal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductData {
    pub tipo: ProductType,
    pub nome: String,
    #[serde(default)]
    pub imagem: Option<String>,
    #[serde(default, rename = "referenciaPai")]
    pub referencia_pai: Option<String>,
    pub variacoes: Vec<Variation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProductData {
        ProductData {
            tipo: ProductType::Simples,
            nome: "Camiseta Básica".into(),
            imagem: Some("https://cdn.example.com/img.jpg".into()),
            referencia_pai: Some("CAM-001".into()),
            variacoes: vec![
                Variation { tamanho: "P".into(), referencia: "CAM-001-P".into(), estoque: Some(10) },
                Variation { tamanho: "M".into(), referencia: "CAM-001-M".into(), estoque: Some(0) },
                Variation { tamanho: "G".into(), referencia: "CAM-001-G".into(), estoque: None },
            ],
        }
    }

    #[test]
    fn test_serde_round_trip() {
        let original = sample();
        let json = serde_json::to_string(&original).unwrap();
        let back: ProductData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["tipo"], "simples");
        assert_eq!(json["referenciaPai"], "CAM-001");
        assert_eq!(json["variacoes"][0]["tamanho"], "P");
        assert_eq!(json["variacoes"][2]["estoque"], serde_json::Value::Null);
    }

    #[test]
    fn test_deserializes_model_output_without_optionals() {
        let raw = r#"{
            "tipo": "desconhecido",
            "nome": "Kit Verão",
            "variacoes": [{"tamanho": "U", "referencia": "KV-01"}]
        }"#;
        let data: ProductData = serde_json::from_str(raw).unwrap();
        assert_eq!(data.tipo, ProductType::Desconhecido);
        assert_eq!(data.imagem, None);
        assert_eq!(data.variacoes[0].estoque, None);
    }
}
