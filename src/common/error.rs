use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::asset_store::AssetStoreError;
use crate::services::authz::DenyReason;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Cada família de falha carrega informação suficiente para distinguir
// "não existe" de "não é seu" de "nome ocupado" de "estado errado" --
// nunca colapsamos essas famílias em um erro genérico.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Conta suspensa")]
    AccountSuspended,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Empresa não encontrada")]
    CompanyNotFound,

    #[error("Filial não encontrada")]
    BranchNotFound,

    #[error("Acesso negado: {0}")]
    AccessDenied(DenyReason),

    #[error("Nome de empresa indisponível: {0}")]
    NameUnavailable(String),

    #[error("A empresa já está arquivada")]
    AlreadyArchived,

    #[error("A empresa não está arquivada")]
    NotArchived,

    #[error("Limite de empresas por dono atingido")]
    CompanyLimitReached,

    #[error("O usuário não é um funcionário com filial atribuída")]
    NotAnEmployee,

    // Falha transitória (deadlock, timeout, pool esgotada): o chamador pode
    // repetir a operação UMA vez; este núcleo nunca repete sozinho.
    #[error("Falha transitória no banco de dados")]
    TransientStorage(#[source] sqlx::Error),

    #[error("Erro de banco de dados")]
    Database(#[source] sqlx::Error),

    #[error("Erro no armazenamento de ativos: {0}")]
    AssetStore(#[from] AssetStoreError),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    Internal(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

// Códigos Postgres que sinalizam falha transitória: serialização (40001),
// deadlock (40P01), lock não disponível (55P03) e statement timeout (57014).
const TRANSIENT_PG_CODES: [&str; 4] = ["40001", "40P01", "55P03", "57014"];

fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .map(|code| TRANSIENT_PG_CODES.contains(&code.as_ref()))
            .unwrap_or(false),
        _ => false,
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if is_transient(&err) {
            AppError::TransientStorage(err)
        } else {
            AppError::Database(err)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::AccessDenied(reason) => {
                let body = Json(json!({ "error": format!("Acesso negado: {}.", reason) }));
                return (StatusCode::FORBIDDEN, body).into_response();
            }
            AppError::NameUnavailable(name) => {
                let body = Json(json!({
                    "error": format!("O nome '{}' já está em uso por outra empresa.", name),
                }));
                return (StatusCode::CONFLICT, body).into_response();
            }

            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "Este e-mail já está em uso."),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos."),
            AppError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "Token de autenticação inválido ou ausente.")
            }
            AppError::AccountSuspended => (StatusCode::FORBIDDEN, "Esta conta está suspensa."),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "Usuário não encontrado."),
            AppError::CompanyNotFound => (StatusCode::NOT_FOUND, "Empresa não encontrada."),
            AppError::BranchNotFound => (StatusCode::NOT_FOUND, "Filial não encontrada."),
            AppError::AlreadyArchived => (StatusCode::CONFLICT, "A empresa já está arquivada."),
            AppError::NotArchived => (StatusCode::CONFLICT, "A empresa não está arquivada."),
            AppError::CompanyLimitReached => {
                (StatusCode::UNPROCESSABLE_ENTITY, "Limite de empresas por conta atingido.")
            }
            AppError::NotAnEmployee => {
                (StatusCode::CONFLICT, "O usuário não é um funcionário com filial atribuída.")
            }
            AppError::TransientStorage(ref e) => {
                tracing::warn!("Falha transitória no banco de dados: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "Falha temporária. Tente novamente.")
            }
            AppError::AssetStore(ref e) => {
                tracing::error!("Erro no armazenamento de ativos: {}", e);
                (StatusCode::BAD_GATEWAY, "Falha no armazenamento de imagens.")
            }

            // Todos os outros (Database, Internal, Bcrypt, Jwt) viram 500.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
