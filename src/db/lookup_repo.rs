// src/db/lookup_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;

// Projeções mínimas que os gates precisam. Leituras puras: nunca tomam lock.

#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct OwnerProjection {
    pub owner_id: Uuid,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct BranchProjection {
    pub id: Uuid,
    pub company_id: Uuid,
    pub active: bool,
}

#[derive(Clone)]
pub struct LookupRepository {
    pool: PgPool,
}

impl LookupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn fetch_owner_projection(
        &self,
        company_id: Uuid,
    ) -> Result<Option<OwnerProjection>, AppError> {
        sqlx::query_as::<_, OwnerProjection>(
            "SELECT owner_id, (state = 'active') AS active FROM companies WHERE id = $1",
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn fetch_branch_projection(
        &self,
        branch_id: Uuid,
    ) -> Result<Option<BranchProjection>, AppError> {
        sqlx::query_as::<_, BranchProjection>(
            "SELECT id, company_id, active FROM branches WHERE id = $1",
        )
        .bind(branch_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }
}
