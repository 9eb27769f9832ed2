// src/db/company_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::company::Company;

/// Conjunto de colunas alteradas por um update. O serviço calcula o diff
/// mínimo; aqui só escrevemos o que de fato mudou.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CompanyChanges {
    /// (nome de exibição, nome normalizado) -- sempre andam juntos.
    pub name: Option<(String, String)>,
    pub description: Option<Option<String>>,
    pub logo_ref: Option<Option<String>>,
}

impl CompanyChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.logo_ref.is_none()
    }
}

#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ponto ÚNICO de inserção. A violação do índice único sobre
    /// `normalized_name` é traduzida aqui para `NameUnavailable`; é o índice,
    /// e não qualquer pré-verificação, que arbitra colisões de nome.
    pub async fn insert<'e, E>(
        &self,
        executor: E,
        name: &str,
        normalized_name: &str,
        description: Option<&str>,
        owner_id: Uuid,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (name, normalized_name, description, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(normalized_name)
        .bind(description)
        .bind(owner_id)
        .fetch_one(executor)
        .await
        .map_err(|e| map_name_collision(name, e))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    /// Adquire a linha com lock exclusivo. Deve ser chamada dentro de uma
    /// transação; operações concorrentes sobre a mesma empresa serializam aqui.
    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(Into::into)
    }

    /// Escreve apenas as colunas presentes em `changes`. Uma troca de nome
    /// também pode colidir no índice único e vira `NameUnavailable`.
    pub async fn update_fields<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        changes: &CompanyChanges,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE companies SET updated_at = now()");

        if let Some((name, normalized_name)) = &changes.name {
            qb.push(", name = ").push_bind(name.clone());
            qb.push(", normalized_name = ").push_bind(normalized_name.clone());
        }
        if let Some(description) = &changes.description {
            qb.push(", description = ").push_bind(description.clone());
        }
        if let Some(logo_ref) = &changes.logo_ref {
            qb.push(", logo_ref = ").push_bind(logo_ref.clone());
        }

        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" RETURNING *");

        let display_name = changes
            .name
            .as_ref()
            .map(|(name, _)| name.clone())
            .unwrap_or_default();

        qb.build_query_as::<Company>()
            .fetch_one(executor)
            .await
            .map_err(|e| map_name_collision(&display_name, e))
    }

    // As transições de estado não mexem em updated_at: archived_at é o
    // registro temporal da transição, e arquivar seguido de reativar deve
    // restaurar a linha exatamente como era.
    pub async fn archive<'e, E>(&self, executor: E, id: Uuid) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies
            SET state = 'archived', archived_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    pub async fn reactivate<'e, E>(&self, executor: E, id: Uuid) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies
            SET state = 'active', archived_at = NULL
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    /// Remoção definitiva. As filiais caem em cascata (FK ON DELETE CASCADE).
    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Pré-contagem do teto por dono. Fora de transação de propósito: é um
    /// limite suave, e o índice único continua sendo o único árbitro de nome.
    pub async fn count_by_owner(&self, owner_id: Uuid) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM companies WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Into::into)
    }

    pub async fn normalized_name_exists(&self, normalized_name: &str) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM companies WHERE normalized_name = $1)",
        )
        .bind(normalized_name)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Company>, AppError> {
        sqlx::query_as::<_, Company>(
            "SELECT * FROM companies WHERE owner_id = $1 ORDER BY created_at",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }
}

fn map_name_collision(name: &str, e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::NameUnavailable(name.to_string());
        }
    }
    e.into()
}
