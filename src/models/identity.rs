// src/models/identity.rs

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;
use utoipa::ToSchema;

use crate::common::error::AppError;

// ---
// 1. Papéis e estado de conta
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
    Guest,
    Operator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "account_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountState {
    Pending,
    Active,
    Suspended,
}

// ---
// 2. Matriz de permissões (o "blob" tipado)
// ---
// Armazenada como JSONB no registro do usuário e desserializada UMA vez
// por requisição -- os gates nunca re-interpretam o blob.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum PermissionModule {
    Products,
    Categories,
    Schedules,
    Socials,
    Location,
    BranchInfo,
}

impl fmt::Display for PermissionModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PermissionModule::Products => "products",
            PermissionModule::Categories => "categories",
            PermissionModule::Schedules => "schedules",
            PermissionModule::Socials => "socials",
            PermissionModule::Location => "location",
            PermissionModule::BranchInfo => "branchInfo",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PermissionAction {
    View,
    Create,
    Edit,
    Delete,
}

impl fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PermissionAction::View => "view",
            PermissionAction::Create => "create",
            PermissionAction::Edit => "edit",
            PermissionAction::Delete => "delete",
        };
        write!(f, "{}", name)
    }
}

// Flags de um módulo. Campo ausente no JSON = false (fechado por padrão).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleActions {
    pub can_view: bool,
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl ModuleActions {
    pub fn allows(&self, action: PermissionAction) -> bool {
        match action {
            PermissionAction::View => self.can_view,
            PermissionAction::Create => self.can_create,
            PermissionAction::Edit => self.can_edit,
            PermissionAction::Delete => self.can_delete,
        }
    }
}

/// Mapeamento módulo -> ações permitidas de um funcionário.
/// Módulo ausente do mapa equivale a todas as ações negadas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMatrix(pub HashMap<PermissionModule, ModuleActions>);

impl PermissionMatrix {
    pub fn allows(&self, module: PermissionModule, action: PermissionAction) -> bool {
        self.0
            .get(&module)
            .map(|actions| actions.allows(action))
            .unwrap_or(false)
    }
}

// ---
// 3. Usuário (linha do banco)
// ---

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,

    #[serde(skip_serializing)]
    #[schema(ignore)] // Nunca expomos o hash
    pub password_hash: String,

    pub role: Role,
    pub account_state: AccountState,

    // Presentes apenas quando role = employee
    pub assigned_branch_id: Option<Uuid>,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub permissions: Option<Json<PermissionMatrix>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 4. IdentityContext (o principal da requisição)
// ---
// Construído uma vez por requisição a partir da credencial verificada,
// imutável, descartado no fim da requisição.

#[derive(Debug, Clone)]
pub struct IdentityContext {
    pub user_id: Uuid,
    pub role: Role,
    pub account_state: AccountState,
    pub assigned_branch_id: Option<Uuid>,
    pub permissions: Option<PermissionMatrix>,
}

impl IdentityContext {
    /// Constrói o principal a partir da linha do usuário, verificando a
    /// invariante: filial atribuída e matriz presentes sse role = employee.
    pub fn from_user(user: &User) -> Result<Self, AppError> {
        let consistent = if user.role == Role::Employee {
            user.assigned_branch_id.is_some() && user.permissions.is_some()
        } else {
            user.assigned_branch_id.is_none() && user.permissions.is_none()
        };

        if !consistent {
            return Err(AppError::Internal(anyhow::anyhow!(
                "registro de usuário {} inconsistente: role={:?}, filial={:?}, matriz presente={}",
                user.id,
                user.role,
                user.assigned_branch_id,
                user.permissions.is_some(),
            )));
        }

        Ok(Self {
            user_id: user.id,
            role: user.role,
            account_state: user.account_state,
            assigned_branch_id: user.assigned_branch_id,
            permissions: user.permissions.as_ref().map(|json| json.0.clone()),
        })
    }
}

// ---
// 5. Payloads e claims de autenticação
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time
    pub iat: usize, // Issued At
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_row(role: Role, branch: Option<Uuid>, matrix: Option<PermissionMatrix>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "conta@exemplo.com".into(),
            password_hash: "$2b$fake".into(),
            role,
            account_state: AccountState::Active,
            assigned_branch_id: branch,
            permissions: matrix.map(Json),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn matriz_nega_modulo_ausente() {
        let matrix: PermissionMatrix =
            serde_json::from_str(r#"{"products":{"canEdit":true}}"#).unwrap();

        assert!(matrix.allows(PermissionModule::Products, PermissionAction::Edit));
        // `categories` não aparece no blob: toda ação é negada.
        assert!(!matrix.allows(PermissionModule::Categories, PermissionAction::Delete));
        assert!(!matrix.allows(PermissionModule::Categories, PermissionAction::View));
    }

    #[test]
    fn matriz_nega_acao_ausente_no_modulo() {
        let matrix: PermissionMatrix =
            serde_json::from_str(r#"{"products":{"canEdit":true}}"#).unwrap();

        // canView não veio no JSON: default false.
        assert!(!matrix.allows(PermissionModule::Products, PermissionAction::View));
        assert!(!matrix.allows(PermissionModule::Products, PermissionAction::Delete));
    }

    #[test]
    fn matriz_vazia_nega_tudo() {
        let matrix = PermissionMatrix::default();
        assert!(!matrix.allows(PermissionModule::BranchInfo, PermissionAction::View));
    }

    #[test]
    fn chaves_da_matriz_usam_camel_case() {
        let matrix: PermissionMatrix =
            serde_json::from_str(r#"{"branchInfo":{"canView":true}}"#).unwrap();
        assert!(matrix.allows(PermissionModule::BranchInfo, PermissionAction::View));
    }

    #[test]
    fn contexto_de_funcionario_exige_filial_e_matriz() {
        let ok = user_row(
            Role::Employee,
            Some(Uuid::new_v4()),
            Some(PermissionMatrix::default()),
        );
        assert!(IdentityContext::from_user(&ok).is_ok());

        let sem_filial = user_row(Role::Employee, None, Some(PermissionMatrix::default()));
        assert!(IdentityContext::from_user(&sem_filial).is_err());

        let sem_matriz = user_row(Role::Employee, Some(Uuid::new_v4()), None);
        assert!(IdentityContext::from_user(&sem_matriz).is_err());
    }

    #[test]
    fn contexto_de_admin_rejeita_campos_de_funcionario() {
        let ok = user_row(Role::Admin, None, None);
        assert!(IdentityContext::from_user(&ok).is_ok());

        let com_filial = user_row(
            Role::Admin,
            Some(Uuid::new_v4()),
            Some(PermissionMatrix::default()),
        );
        assert!(IdentityContext::from_user(&com_filial).is_err());

        let so_filial = user_row(Role::Admin, Some(Uuid::new_v4()), None);
        assert!(IdentityContext::from_user(&so_filial).is_err());
    }
}
