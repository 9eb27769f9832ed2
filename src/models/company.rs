// src/models/company.rs

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;
use utoipa::ToSchema;

// ---
// 1. Company (a "Empresa")
// ---
// O recurso governado pela máquina de estados de ciclo de vida.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "company_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CompanyState {
    Active,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(example = "Acme Inc")]
    pub name: String,

    // Coluna interna de arbitragem de unicidade
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub normalized_name: String,

    pub description: Option<String>,
    pub owner_id: Uuid,
    pub logo_ref: Option<String>,
    pub state: CompanyState,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 2. Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyPayload {
    #[validate(length(min = 1, max = 255, message = "O nome deve ter entre 1 e 255 caracteres."))]
    #[schema(example = "Acme Inc")]
    pub name: String,

    #[validate(length(max = 1000, message = "A descrição deve ter no máximo 1000 caracteres."))]
    pub description: Option<String>,
}

// Semântica do campo `logo` num PATCH:
//   ausente        -> mantém o logo atual
//   null           -> remove a referência e apaga o ativo armazenado
//   "string"       -> armazena a referência tal como veio (não vazia)
//   {"data": b64}  -> faz upload dos bytes e armazena a referência devolvida
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LogoPatch {
    #[default]
    Unchanged,
    Remove,
    Reference(String),
    Upload(Vec<u8>),
}

fn deserialize_logo_patch<'de, D>(deserializer: D) -> Result<LogoPatch, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Reference(String),
        Upload { data: String },
    }

    match Option::<Wire>::deserialize(deserializer)? {
        None => Ok(LogoPatch::Remove),
        Some(Wire::Reference(reference)) => {
            if reference.is_empty() {
                return Err(serde::de::Error::custom(
                    "a referência de logo não pode ser vazia; use null para remover",
                ));
            }
            Ok(LogoPatch::Reference(reference))
        }
        Some(Wire::Upload { data }) => base64::engine::general_purpose::STANDARD
            .decode(data)
            .map(LogoPatch::Upload)
            .map_err(|e| serde::de::Error::custom(format!("logo em base64 inválido: {}", e))),
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyPayload {
    #[validate(length(min = 1, max = 255, message = "O nome deve ter entre 1 e 255 caracteres."))]
    pub name: Option<String>,

    #[validate(length(max = 1000, message = "A descrição deve ter no máximo 1000 caracteres."))]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "deserialize_logo_patch")]
    #[schema(value_type = Option<String>, example = "https://cdn.exemplo.com/logo.png")]
    pub logo: LogoPatch,
}

// ---
// 3. Disponibilidade de nome (dica de UX)
// ---

#[derive(Debug, Deserialize, ToSchema)]
pub struct NameAvailabilityQuery {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NameAvailabilityResponse {
    pub available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> UpdateCompanyPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn logo_ausente_mantem_o_atual() {
        let payload = parse(r#"{"name":"Acme"}"#);
        assert_eq!(payload.logo, LogoPatch::Unchanged);
    }

    #[test]
    fn logo_null_remove() {
        let payload = parse(r#"{"logo":null}"#);
        assert_eq!(payload.logo, LogoPatch::Remove);
    }

    #[test]
    fn logo_string_vira_referencia_literal() {
        let payload = parse(r#"{"logo":"https://cdn.exemplo.com/x.png"}"#);
        assert_eq!(
            payload.logo,
            LogoPatch::Reference("https://cdn.exemplo.com/x.png".into())
        );
    }

    #[test]
    fn logo_string_vazia_e_rejeitada() {
        let result: Result<UpdateCompanyPayload, _> = serde_json::from_str(r#"{"logo":""}"#);
        assert!(result.is_err());
    }

    #[test]
    fn logo_objeto_decodifica_base64() {
        let payload = parse(r#"{"logo":{"data":"aGVsbG8="}}"#);
        assert_eq!(payload.logo, LogoPatch::Upload(b"hello".to_vec()));
    }

    #[test]
    fn logo_base64_invalido_e_rejeitado() {
        let result: Result<UpdateCompanyPayload, _> =
            serde_json::from_str(r#"{"logo":{"data":"%%%"}}"#);
        assert!(result.is_err());
    }
}
