// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- Companies ---
        handlers::companies::create_company,
        handlers::companies::list_my_companies,
        handlers::companies::check_name_availability,
        handlers::companies::get_company,
        handlers::companies::update_company,
        handlers::companies::archive_company,
        handlers::companies::reactivate_company,
        handlers::companies::delete_company,

        // --- Branches ---
        handlers::branches::create_branch,
        handlers::branches::list_branches,
        handlers::branches::get_branch,
        handlers::branches::update_branch_info,

        // --- Employees ---
        handlers::branches::assign_employee,
        handlers::branches::set_employee_permissions,
    ),
    components(
        schemas(
            // --- Auth ---
            models::identity::Role,
            models::identity::AccountState,
            models::identity::User,
            models::identity::RegisterUserPayload,
            models::identity::LoginUserPayload,
            models::identity::AuthResponse,

            // --- Permissões ---
            models::identity::PermissionModule,
            models::identity::PermissionAction,
            models::identity::ModuleActions,

            // --- Companies ---
            models::company::CompanyState,
            models::company::Company,
            models::company::CreateCompanyPayload,
            models::company::UpdateCompanyPayload,
            models::company::NameAvailabilityResponse,

            // --- Branches ---
            models::branch::Branch,
            models::branch::CreateBranchPayload,
            models::branch::UpdateBranchInfoPayload,
            handlers::branches::AssignEmployeePayload,
            handlers::branches::SetPermissionsPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Companies", description = "Ciclo de Vida das Empresas"),
        (name = "Branches", description = "Filiais e Acesso"),
        (name = "Employees", description = "Funcionários e Matriz de Permissões")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
