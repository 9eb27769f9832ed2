// src/models/branch.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use utoipa::ToSchema;

// A filial é o objeto das verificações de acesso (dono via empresa,
// funcionário via atribuição); o catálogo em si vive em outros módulos.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBranchPayload {
    #[validate(length(min = 1, max = 255, message = "O nome da filial é obrigatório."))]
    #[schema(example = "Loja Centro")]
    pub name: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBranchInfoPayload {
    #[validate(length(min = 1, max = 255, message = "O nome da filial é obrigatório."))]
    pub name: Option<String>,

    pub active: Option<bool>,
}
