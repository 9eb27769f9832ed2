// src/services/employee_service.rs

// O fluxo de emissão/validação do token de convite é um colaborador externo;
// este serviço consome o resultado já validado (filial + empresa) para
// promover a conta e manter a matriz de permissões do funcionário.

use sqlx::PgPool;
use uuid::Uuid;
use validator::{ValidationError as FieldError, ValidationErrors};

use crate::common::error::AppError;
use crate::db::UserRepository;
use crate::models::identity::{IdentityContext, PermissionMatrix, Role, User};
use crate::services::authz::{role_gate, AuthzService};

#[derive(Clone)]
pub struct EmployeeService {
    user_repo: UserRepository,
    authz: AuthzService,
    pool: PgPool,
}

impl EmployeeService {
    pub fn new(user_repo: UserRepository, authz: AuthzService, pool: PgPool) -> Self {
        Self { user_repo, authz, pool }
    }

    /// Promove uma conta guest a funcionário da filial, com a matriz inicial.
    /// Só o admin dono da empresa da filial pode consumar a atribuição.
    pub async fn assign_to_branch(
        &self,
        principal: &IdentityContext,
        user_id: Uuid,
        branch_id: Uuid,
        matrix: PermissionMatrix,
    ) -> Result<User, AppError> {
        role_gate(&[Role::Admin], principal).map_err(AppError::AccessDenied)?;
        self.authz.require_branch_access(principal, branch_id).await?;

        let target = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if target.role != Role::Guest {
            let mut errors = ValidationErrors::new();
            let mut error = FieldError::new("role");
            error.message =
                Some("Apenas contas guest podem ser promovidas a funcionário.".into());
            errors.add("userId", error);
            return Err(AppError::ValidationError(errors));
        }

        let mut tx = self.pool.begin().await?;
        let updated = self
            .user_repo
            .set_branch_assignment(&mut *tx, user_id, branch_id, &matrix)
            .await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Substitui a matriz de um funcionário. A mutação não é coordenada com
    /// avaliações concorrentes: uma requisição em voo pode ser decidida com a
    /// versão anterior da matriz, o que é tolerado.
    pub async fn set_permissions(
        &self,
        principal: &IdentityContext,
        employee_id: Uuid,
        matrix: PermissionMatrix,
    ) -> Result<User, AppError> {
        role_gate(&[Role::Admin], principal).map_err(AppError::AccessDenied)?;

        let employee = self
            .user_repo
            .find_by_id(employee_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let branch_id = match (employee.role, employee.assigned_branch_id) {
            (Role::Employee, Some(branch_id)) => branch_id,
            _ => return Err(AppError::NotAnEmployee),
        };

        // O dono da empresa da filial é quem pode mexer na matriz.
        self.authz.require_branch_access(principal, branch_id).await?;

        let mut tx = self.pool.begin().await?;
        let updated = self
            .user_repo
            .set_permissions(&mut *tx, employee_id, &matrix)
            .await?;
        tx.commit().await?;
        Ok(updated)
    }
}
