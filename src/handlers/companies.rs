// src/handlers/companies.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::company::{
        Company, CreateCompanyPayload, NameAvailabilityQuery, NameAvailabilityResponse,
        UpdateCompanyPayload,
    },
};

#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "Companies",
    request_body = CreateCompanyPayload,
    responses(
        (status = 201, description = "Empresa criada", body = Company),
        (status = 409, description = "Nome indisponível"),
        (status = 422, description = "Limite de empresas atingido"),
    ),
    security(("api_jwt" = []))
)]
pub async fn create_company(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Json(payload): Json<CreateCompanyPayload>,
) -> Result<impl IntoResponse, AppError> {
    let company = app_state.company_service.create(&principal, payload).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

#[utoipa::path(
    get,
    path = "/api/companies",
    tag = "Companies",
    responses((status = 200, description = "Empresas do admin autenticado", body = [Company])),
    security(("api_jwt" = []))
)]
pub async fn list_my_companies(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> Result<Json<Vec<Company>>, AppError> {
    let companies = app_state.company_service.list_mine(&principal).await?;
    Ok(Json(companies))
}

// Dica de disponibilidade de nome. NÃO é autoritativa: o resultado pode
// mudar entre esta consulta e o INSERT; a arbitragem real é o índice único.
#[utoipa::path(
    get,
    path = "/api/companies/name-availability",
    tag = "Companies",
    params(("name" = String, Query, description = "Nome candidato (grafia livre)")),
    responses((status = 200, description = "Dica de disponibilidade", body = NameAvailabilityResponse)),
    security(("api_jwt" = []))
)]
pub async fn check_name_availability(
    State(app_state): State<AppState>,
    Query(query): Query<NameAvailabilityQuery>,
) -> Result<Json<NameAvailabilityResponse>, AppError> {
    let available = app_state
        .company_service
        .check_name_availability(&query.name)
        .await?;
    Ok(Json(NameAvailabilityResponse { available }))
}

#[utoipa::path(
    get,
    path = "/api/companies/{id}",
    tag = "Companies",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa do dono autenticado", body = Company),
        (status = 404, description = "Empresa não encontrada"),
    ),
    security(("api_jwt" = []))
)]
pub async fn get_company(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Company>, AppError> {
    let company = app_state.company_service.get(&principal, id).await?;
    Ok(Json(company))
}

#[utoipa::path(
    patch,
    path = "/api/companies/{id}",
    tag = "Companies",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    request_body = UpdateCompanyPayload,
    responses(
        (status = 200, description = "Empresa atualizada (diff mínimo)", body = Company),
        (status = 409, description = "Nome indisponível ou empresa arquivada"),
    ),
    security(("api_jwt" = []))
)]
pub async fn update_company(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCompanyPayload>,
) -> Result<Json<Company>, AppError> {
    let company = app_state
        .company_service
        .update(&principal, id, payload)
        .await?;
    Ok(Json(company))
}

#[utoipa::path(
    post,
    path = "/api/companies/{id}/archive",
    tag = "Companies",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa arquivada", body = Company),
        (status = 409, description = "Já estava arquivada"),
    ),
    security(("api_jwt" = []))
)]
pub async fn archive_company(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Company>, AppError> {
    let company = app_state.company_service.archive(&principal, id).await?;
    Ok(Json(company))
}

#[utoipa::path(
    post,
    path = "/api/companies/{id}/reactivate",
    tag = "Companies",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa reativada", body = Company),
        (status = 409, description = "Não estava arquivada"),
    ),
    security(("api_jwt" = []))
)]
pub async fn reactivate_company(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Company>, AppError> {
    let company = app_state.company_service.reactivate(&principal, id).await?;
    Ok(Json(company))
}

#[utoipa::path(
    delete,
    path = "/api/companies/{id}",
    tag = "Companies",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 204, description = "Empresa excluída definitivamente"),
        (status = 404, description = "Empresa não encontrada"),
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_company(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.company_service.delete(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
