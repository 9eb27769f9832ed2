// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use sqlx::types::Json;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::identity::{PermissionMatrix, Role, User};

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu e-mail
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    // Busca um usuário pelo seu ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    /// Contagem total de contas -- alimenta a BootstrapPolicy no registro.
    pub async fn count_users(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(Into::into)
    }

    // Cria um novo usuário no banco de dados
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            // Converte violação de chave única em um erro mais amigável
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::EmailAlreadyExists;
                }
            }
            e.into()
        })
    }

    /// Consome uma atribuição validada pelo colaborador de convites:
    /// promove a conta a funcionário da filial, com a matriz inicial.
    pub async fn set_branch_assignment<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        branch_id: Uuid,
        matrix: &PermissionMatrix,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET role = $2, assigned_branch_id = $3, permissions = $4, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(Role::Employee)
        .bind(branch_id)
        .bind(Json(matrix.clone()))
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    /// Substitui a matriz de permissões de um funcionário.
    pub async fn set_permissions<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        matrix: &PermissionMatrix,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET permissions = $2, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(Json(matrix.clone()))
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }
}
