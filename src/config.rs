// src/config.rs

use std::sync::Arc;
use std::{env, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::db::{BranchRepository, CompanyRepository, LookupRepository, UserRepository};
use crate::services::{
    asset_store::LocalAssetStore,
    auth::AuthService,
    authz::AuthzService,
    branch_service::BranchService,
    company_service::CompanyService,
    employee_service::EmployeeService,
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    pub auth_service: AuthService,
    pub company_service: CompanyService,
    pub branch_service: BranchService,
    pub employee_service: EmployeeService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");
        let asset_dir = env::var("ASSET_STORE_DIR").unwrap_or_else(|_| "uploads".to_string());

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let company_repo = CompanyRepository::new(db_pool.clone());
        let branch_repo = BranchRepository::new(db_pool.clone());
        let lookup_repo = LookupRepository::new(db_pool.clone());

        let asset_store = Arc::new(LocalAssetStore::new(asset_dir));
        let authz_service = AuthzService::new(lookup_repo);

        let auth_service = AuthService::new(user_repo.clone(), jwt_secret.clone(), db_pool.clone());
        let company_service =
            CompanyService::new(company_repo, asset_store.clone(), db_pool.clone());
        let branch_service =
            BranchService::new(branch_repo, authz_service.clone(), db_pool.clone());
        let employee_service =
            EmployeeService::new(user_repo, authz_service, db_pool.clone());

        Ok(Self {
            db_pool,
            jwt_secret,
            auth_service,
            company_service,
            branch_service,
            employee_service,
        })
    }
}
