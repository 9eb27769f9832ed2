// src/services/branch_service.rs

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::db::branch_repo::{BranchChanges, BranchRepository};
use crate::models::branch::{Branch, CreateBranchPayload, UpdateBranchInfoPayload};
use crate::models::identity::{IdentityContext, PermissionAction, PermissionModule, Role};
use crate::services::authz::{permission_gate, role_gate, AuthzService};

#[derive(Clone)]
pub struct BranchService {
    branch_repo: BranchRepository,
    authz: AuthzService,
    pool: PgPool,
}

impl BranchService {
    pub fn new(branch_repo: BranchRepository, authz: AuthzService, pool: PgPool) -> Self {
        Self { branch_repo, authz, pool }
    }

    /// Cria uma filial numa empresa do admin chamador. A posse exige empresa
    /// ativa -- empresa arquivada congela também a criação de filiais.
    pub async fn create(
        &self,
        principal: &IdentityContext,
        company_id: Uuid,
        payload: CreateBranchPayload,
    ) -> Result<Branch, AppError> {
        payload.validate()?;
        self.authz.require_company_ownership(principal, company_id).await?;

        let mut tx = self.pool.begin().await?;
        let branch = self
            .branch_repo
            .insert(&mut *tx, company_id, payload.name.trim())
            .await?;
        tx.commit().await?;
        Ok(branch)
    }

    pub async fn list(
        &self,
        principal: &IdentityContext,
        company_id: Uuid,
    ) -> Result<Vec<Branch>, AppError> {
        self.authz.require_company_ownership(principal, company_id).await?;
        self.branch_repo.list_by_company(company_id).await
    }

    /// Leitura de uma filial pela cadeia completa de gates:
    /// role_gate -> branch_access_gate -> permission_gate(branchInfo, view).
    pub async fn get(
        &self,
        principal: &IdentityContext,
        branch_id: Uuid,
    ) -> Result<Branch, AppError> {
        role_gate(&[Role::Admin, Role::Employee], principal)
            .map_err(AppError::AccessDenied)?;
        self.authz.require_branch_access(principal, branch_id).await?;
        permission_gate(PermissionModule::BranchInfo, PermissionAction::View, principal)
            .map_err(AppError::AccessDenied)?;

        self.branch_repo
            .find_by_id(branch_id)
            .await?
            .ok_or(AppError::BranchNotFound)
    }

    /// Atualização das informações da filial, mesma cadeia de gates com a
    /// ação de edição. Diff mínimo: sem mudança, devolve a linha sem escrever.
    pub async fn update_info(
        &self,
        principal: &IdentityContext,
        branch_id: Uuid,
        payload: UpdateBranchInfoPayload,
    ) -> Result<Branch, AppError> {
        payload.validate()?;
        role_gate(&[Role::Admin, Role::Employee], principal)
            .map_err(AppError::AccessDenied)?;
        self.authz.require_branch_access(principal, branch_id).await?;
        permission_gate(PermissionModule::BranchInfo, PermissionAction::Edit, principal)
            .map_err(AppError::AccessDenied)?;

        let current = self
            .branch_repo
            .find_by_id(branch_id)
            .await?
            .ok_or(AppError::BranchNotFound)?;

        let mut changes = BranchChanges::default();
        if let Some(name) = &payload.name {
            let trimmed = name.trim();
            if trimmed != current.name {
                changes.name = Some(trimmed.to_string());
            }
        }
        if let Some(active) = payload.active {
            if active != current.active {
                changes.active = Some(active);
            }
        }

        if changes.is_empty() {
            return Ok(current);
        }

        let mut tx = self.pool.begin().await?;
        let updated = self.branch_repo.update_info(&mut *tx, branch_id, &changes).await?;
        tx.commit().await?;
        Ok(updated)
    }
}
