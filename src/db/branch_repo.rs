// src/db/branch_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::branch::Branch;

/// Colunas de informação da filial alteradas por um update parcial.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BranchChanges {
    pub name: Option<String>,
    pub active: Option<bool>,
}

impl BranchChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.active.is_none()
    }
}

#[derive(Clone)]
pub struct BranchRepository {
    pool: PgPool,
}

impl BranchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        name: &str,
    ) -> Result<Branch, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Branch>(
            r#"
            INSERT INTO branches (company_id, name)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(name)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Branch>, AppError> {
        sqlx::query_as::<_, Branch>("SELECT * FROM branches WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    pub async fn list_by_company(&self, company_id: Uuid) -> Result<Vec<Branch>, AppError> {
        sqlx::query_as::<_, Branch>(
            "SELECT * FROM branches WHERE company_id = $1 ORDER BY created_at",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn update_info<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        changes: &BranchChanges,
    ) -> Result<Branch, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE branches SET updated_at = now()");

        if let Some(name) = &changes.name {
            qb.push(", name = ").push_bind(name.clone());
        }
        if let Some(active) = changes.active {
            qb.push(", active = ").push_bind(active);
        }

        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" RETURNING *");

        qb.build_query_as::<Branch>()
            .fetch_one(executor)
            .await
            .map_err(Into::into)
    }
}
