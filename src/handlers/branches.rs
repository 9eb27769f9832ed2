// src/handlers/branches.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::branch::{Branch, CreateBranchPayload, UpdateBranchInfoPayload},
    models::identity::{PermissionMatrix, User},
};

// ---
// Payloads próprios desta superfície
// ---

// A atribuição chega aqui já validada pelo fluxo de convite; o handler só
// entrega o par (conta, filial) e a matriz inicial ao serviço.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignEmployeePayload {
    pub user_id: Uuid,

    #[schema(value_type = Object)]
    pub permissions: PermissionMatrix,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetPermissionsPayload {
    #[schema(value_type = Object)]
    pub permissions: PermissionMatrix,
}

// ---
// Handlers
// ---

#[utoipa::path(
    post,
    path = "/api/companies/{id}/branches",
    tag = "Branches",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    request_body = CreateBranchPayload,
    responses(
        (status = 201, description = "Filial criada", body = Branch),
        (status = 403, description = "A empresa não pertence a esta conta"),
    ),
    security(("api_jwt" = []))
)]
pub async fn create_branch(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<CreateBranchPayload>,
) -> Result<impl IntoResponse, AppError> {
    let branch = app_state
        .branch_service
        .create(&principal, company_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(branch)))
}

#[utoipa::path(
    get,
    path = "/api/companies/{id}/branches",
    tag = "Branches",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses((status = 200, description = "Filiais da empresa", body = [Branch])),
    security(("api_jwt" = []))
)]
pub async fn list_branches(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Vec<Branch>>, AppError> {
    let branches = app_state.branch_service.list(&principal, company_id).await?;
    Ok(Json(branches))
}

#[utoipa::path(
    get,
    path = "/api/branches/{id}",
    tag = "Branches",
    params(("id" = Uuid, Path, description = "ID da filial")),
    responses(
        (status = 200, description = "Dados da filial", body = Branch),
        (status = 403, description = "Acesso negado (dono/atribuição/permissão)"),
    ),
    security(("api_jwt" = []))
)]
pub async fn get_branch(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(branch_id): Path<Uuid>,
) -> Result<Json<Branch>, AppError> {
    let branch = app_state.branch_service.get(&principal, branch_id).await?;
    Ok(Json(branch))
}

#[utoipa::path(
    patch,
    path = "/api/branches/{id}/info",
    tag = "Branches",
    params(("id" = Uuid, Path, description = "ID da filial")),
    request_body = UpdateBranchInfoPayload,
    responses(
        (status = 200, description = "Informações atualizadas", body = Branch),
        (status = 403, description = "Acesso negado (dono/atribuição/permissão)"),
    ),
    security(("api_jwt" = []))
)]
pub async fn update_branch_info(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(branch_id): Path<Uuid>,
    Json(payload): Json<UpdateBranchInfoPayload>,
) -> Result<Json<Branch>, AppError> {
    let branch = app_state
        .branch_service
        .update_info(&principal, branch_id, payload)
        .await?;
    Ok(Json(branch))
}

#[utoipa::path(
    post,
    path = "/api/branches/{id}/employees",
    tag = "Employees",
    params(("id" = Uuid, Path, description = "ID da filial")),
    request_body = AssignEmployeePayload,
    responses(
        (status = 200, description = "Conta promovida a funcionário da filial", body = User),
        (status = 403, description = "Só o dono da empresa pode atribuir funcionários"),
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_employee(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(branch_id): Path<Uuid>,
    Json(payload): Json<AssignEmployeePayload>,
) -> Result<Json<User>, AppError> {
    let user = app_state
        .employee_service
        .assign_to_branch(&principal, payload.user_id, branch_id, payload.permissions)
        .await?;
    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/api/employees/{id}/permissions",
    tag = "Employees",
    params(("id" = Uuid, Path, description = "ID do funcionário")),
    request_body = SetPermissionsPayload,
    responses(
        (status = 200, description = "Matriz de permissões substituída", body = User),
        (status = 409, description = "A conta não é um funcionário"),
    ),
    security(("api_jwt" = []))
)]
pub async fn set_employee_permissions(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(employee_id): Path<Uuid>,
    Json(payload): Json<SetPermissionsPayload>,
) -> Result<Json<User>, AppError> {
    let user = app_state
        .employee_service
        .set_permissions(&principal, employee_id, payload.permissions)
        .await?;
    Ok(Json(user))
}
