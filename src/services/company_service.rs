// src/services/company_service.rs

// A máquina de estados do ciclo de vida da empresa:
//   active -> archived -> active  (reversível)
//   active/archived -> excluída   (terminal, com limpeza de ativos)
// Toda operação de mutação roda numa única transação e adquire a linha com
// lock exclusivo antes de revalidar as pré-condições; quem perde a corrida
// enxerga o estado commitado do vencedor (um segundo `archive` concorrente
// recebe `AlreadyArchived`, nunca um double-apply silencioso).

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;
use validator::{Validate, ValidationError as FieldError, ValidationErrors};

use crate::common::error::AppError;
use crate::common::normalize::{display_name, normalize_name};
use crate::db::company_repo::{CompanyChanges, CompanyRepository};
use crate::models::company::{
    Company, CompanyState, CreateCompanyPayload, LogoPatch, UpdateCompanyPayload,
};
use crate::models::identity::{IdentityContext, Role};
use crate::services::asset_store::{AssetStore, AssetStoreError};
use crate::services::authz::{role_gate, DenyReason};

/// Teto de empresas por dono. Limite SUAVE: a pré-contagem não participa da
/// transação de inserção, então criações concorrentes podem excedê-lo por
/// pouco; o índice único de nome segue sendo a única arbitragem dura.
pub const MAX_COMPANIES_PER_OWNER: i64 = 10;

#[derive(Clone)]
pub struct CompanyService {
    company_repo: CompanyRepository,
    asset_store: Arc<dyn AssetStore>,
    pool: PgPool,
}

impl CompanyService {
    pub fn new(
        company_repo: CompanyRepository,
        asset_store: Arc<dyn AssetStore>,
        pool: PgPool,
    ) -> Self {
        Self { company_repo, asset_store, pool }
    }

    /// Cria uma empresa ativa para o admin chamador. A colisão de nome é
    /// decidida exclusivamente pelo índice único no momento do INSERT --
    /// duas criações concorrentes com o mesmo nome normalizado terminam em
    /// exatamente um sucesso e um `NameUnavailable`.
    pub async fn create(
        &self,
        principal: &IdentityContext,
        payload: CreateCompanyPayload,
    ) -> Result<Company, AppError> {
        role_gate(&[Role::Admin], principal).map_err(AppError::AccessDenied)?;
        payload.validate()?;

        let normalized = normalize_name(&payload.name);
        validate_normalized_name(&normalized)?;

        let owned = self.company_repo.count_by_owner(principal.user_id).await?;
        if owned >= MAX_COMPANIES_PER_OWNER {
            return Err(AppError::CompanyLimitReached);
        }

        let mut tx = self.pool.begin().await?;
        let company = self
            .company_repo
            .insert(
                &mut *tx,
                display_name(&payload.name),
                &normalized,
                payload.description.as_deref(),
                principal.user_id,
            )
            .await?;
        tx.commit().await?;

        Ok(company)
    }

    /// Atualização parcial. Com a linha sob lock: verifica o dono, rejeita
    /// empresa arquivada (arquivar congela as operações normais), calcula o
    /// diff mínimo e só escreve o que mudou -- sem mudança alguma, devolve a
    /// linha atual sem escrita.
    pub async fn update(
        &self,
        principal: &IdentityContext,
        id: Uuid,
        payload: UpdateCompanyPayload,
    ) -> Result<Company, AppError> {
        role_gate(&[Role::Admin], principal).map_err(AppError::AccessDenied)?;
        payload.validate()?;

        let mut tx = self.pool.begin().await?;
        let current = self
            .company_repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::CompanyNotFound)?;

        if current.owner_id != principal.user_id {
            return Err(AppError::AccessDenied(DenyReason::NotOwner));
        }
        if current.state == CompanyState::Archived {
            return Err(AppError::AlreadyArchived);
        }

        let mut changes = compute_field_changes(&current, &payload)?;

        // Semântica do logo: bytes -> upload e guarda a referência devolvida;
        // string não vazia -> guarda tal como veio; null -> limpa e apaga o
        // ativo armazenado (após o commit).
        let mut stale_asset = false;
        match decide_logo(current.logo_ref.as_deref(), &payload.logo) {
            LogoDecision::Keep => {}
            LogoDecision::Upload(bytes) => {
                let reference = self.asset_store.put(&id.to_string(), &bytes).await?;
                if current.logo_ref.as_deref() != Some(reference.as_str()) {
                    changes.logo_ref = Some(Some(reference));
                }
            }
            LogoDecision::SetReference(reference) => {
                changes.logo_ref = Some(Some(reference));
            }
            LogoDecision::Clear { delete_asset } => {
                changes.logo_ref = Some(None);
                stale_asset = delete_asset;
            }
        }

        if changes.is_empty() {
            tx.commit().await?;
            return Ok(current);
        }

        let updated = self.company_repo.update_fields(&mut *tx, id, &changes).await?;
        tx.commit().await?;

        // A linha já está commitada; a exclusão do ativo antigo é melhor
        // esforço e apenas logada em caso de falha (lacuna de consistência
        // aceita, nunca um rollback).
        if stale_asset {
            self.cleanup_asset(id).await;
        }

        Ok(updated)
    }

    pub async fn archive(
        &self,
        principal: &IdentityContext,
        id: Uuid,
    ) -> Result<Company, AppError> {
        role_gate(&[Role::Admin], principal).map_err(AppError::AccessDenied)?;

        let mut tx = self.pool.begin().await?;
        let current = self
            .company_repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::CompanyNotFound)?;

        if current.owner_id != principal.user_id {
            return Err(AppError::AccessDenied(DenyReason::NotOwner));
        }
        if current.state == CompanyState::Archived {
            return Err(AppError::AlreadyArchived);
        }

        let archived = self.company_repo.archive(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(archived)
    }

    pub async fn reactivate(
        &self,
        principal: &IdentityContext,
        id: Uuid,
    ) -> Result<Company, AppError> {
        role_gate(&[Role::Admin], principal).map_err(AppError::AccessDenied)?;

        let mut tx = self.pool.begin().await?;
        let current = self
            .company_repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::CompanyNotFound)?;

        if current.owner_id != principal.user_id {
            return Err(AppError::AccessDenied(DenyReason::NotOwner));
        }
        if current.state != CompanyState::Archived {
            return Err(AppError::NotArchived);
        }

        let reactivated = self.company_repo.reactivate(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(reactivated)
    }

    /// Exclusão definitiva, permitida a partir de qualquer estado não
    /// excluído. Se houver logo, o ativo externo é removido antes da linha:
    /// "já não existe" no armazenamento é tolerado (dupla exclusão) e apenas
    /// logado; qualquer outra falha aborta a transação.
    pub async fn delete(&self, principal: &IdentityContext, id: Uuid) -> Result<(), AppError> {
        role_gate(&[Role::Admin], principal).map_err(AppError::AccessDenied)?;

        let mut tx = self.pool.begin().await?;
        let current = self
            .company_repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::CompanyNotFound)?;

        if current.owner_id != principal.user_id {
            return Err(AppError::AccessDenied(DenyReason::NotOwner));
        }

        if current.logo_ref.is_some() {
            match self.asset_store.delete(&id.to_string()).await {
                Ok(()) => {}
                Err(AssetStoreError::NotFound) => {
                    tracing::warn!(company_id = %id, "logo já ausente do armazenamento ao excluir a empresa");
                }
                Err(e) => return Err(e.into()),
            }
        }

        // TODO: decidir se a exclusão deve exigir zero filiais dependentes;
        // hoje as filiais caem em cascata junto com a empresa.
        self.company_repo.delete(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Dica de UX, usando a MESMA normalização da arbitragem. Explicitamente
    /// não autoritativa e sujeita a corrida: quem chama nunca deve pular a
    /// arbitragem do INSERT com base neste resultado.
    pub async fn check_name_availability(&self, raw_name: &str) -> Result<bool, AppError> {
        let normalized = normalize_name(raw_name);
        if normalized.is_empty() {
            // Um nome que normaliza para vazio nunca poderá ser criado.
            return Ok(false);
        }
        let exists = self.company_repo.normalized_name_exists(&normalized).await?;
        Ok(!exists)
    }

    pub async fn get(&self, principal: &IdentityContext, id: Uuid) -> Result<Company, AppError> {
        role_gate(&[Role::Admin], principal).map_err(AppError::AccessDenied)?;

        let company = self
            .company_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::CompanyNotFound)?;

        if company.owner_id != principal.user_id {
            return Err(AppError::AccessDenied(DenyReason::NotOwner));
        }
        Ok(company)
    }

    pub async fn list_mine(&self, principal: &IdentityContext) -> Result<Vec<Company>, AppError> {
        role_gate(&[Role::Admin], principal).map_err(AppError::AccessDenied)?;
        self.company_repo.list_by_owner(principal.user_id).await
    }

    async fn cleanup_asset(&self, company_id: Uuid) {
        match self.asset_store.delete(&company_id.to_string()).await {
            Ok(()) => {}
            Err(AssetStoreError::NotFound) => {
                tracing::warn!(%company_id, "logo já ausente do armazenamento na limpeza");
            }
            Err(e) => {
                tracing::error!(
                    %company_id,
                    erro = %e,
                    "falha ao excluir o logo antigo; a linha já foi commitada"
                );
            }
        }
    }
}

// ---
// Helpers puros (testáveis sem banco)
// ---

fn validate_normalized_name(normalized: &str) -> Result<(), AppError> {
    if normalized.is_empty() || normalized.chars().count() > 255 {
        let mut errors = ValidationErrors::new();
        let mut error = FieldError::new("length");
        error.message =
            Some("O nome deve ter entre 1 e 255 caracteres após normalização.".into());
        errors.add("name", error);
        return Err(AppError::ValidationError(errors));
    }
    Ok(())
}

/// Diff mínimo de nome e descrição contra a linha atual.
fn compute_field_changes(
    current: &Company,
    payload: &UpdateCompanyPayload,
) -> Result<CompanyChanges, AppError> {
    let mut changes = CompanyChanges::default();

    if let Some(name) = &payload.name {
        let normalized = normalize_name(name);
        validate_normalized_name(&normalized)?;
        let display = display_name(name);
        if normalized != current.normalized_name || display != current.name {
            changes.name = Some((display.to_string(), normalized));
        }
    }

    if let Some(description) = &payload.description {
        if current.description.as_deref() != Some(description.as_str()) {
            changes.description = Some(Some(description.clone()));
        }
    }

    Ok(changes)
}

#[derive(Debug, PartialEq)]
enum LogoDecision {
    Keep,
    Upload(Vec<u8>),
    SetReference(String),
    Clear { delete_asset: bool },
}

fn decide_logo(current_ref: Option<&str>, patch: &LogoPatch) -> LogoDecision {
    match patch {
        LogoPatch::Unchanged => LogoDecision::Keep,
        LogoPatch::Remove => {
            if current_ref.is_some() {
                LogoDecision::Clear { delete_asset: true }
            } else {
                LogoDecision::Keep
            }
        }
        LogoPatch::Reference(reference) => {
            if current_ref == Some(reference.as_str()) {
                LogoDecision::Keep
            } else {
                LogoDecision::SetReference(reference.clone())
            }
        }
        LogoPatch::Upload(bytes) => LogoDecision::Upload(bytes.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn company(name: &str, description: Option<&str>, logo_ref: Option<&str>) -> Company {
        Company {
            id: Uuid::new_v4(),
            name: name.to_string(),
            normalized_name: normalize_name(name),
            description: description.map(String::from),
            owner_id: Uuid::new_v4(),
            logo_ref: logo_ref.map(String::from),
            state: CompanyState::Active,
            archived_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    // --- compute_field_changes ---

    #[test]
    fn payload_vazio_nao_gera_mudancas() {
        let current = company("Acme Inc", Some("descrição"), None);
        let changes =
            compute_field_changes(&current, &UpdateCompanyPayload::default()).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn mesmo_nome_e_descricao_nao_geram_escrita() {
        let current = company("Acme Inc", Some("descrição"), None);
        let payload = UpdateCompanyPayload {
            name: Some("Acme Inc".into()),
            description: Some("descrição".into()),
            logo: LogoPatch::Unchanged,
        };
        let changes = compute_field_changes(&current, &payload).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn troca_de_nome_carrega_exibicao_e_normalizado() {
        let current = company("Acme Inc", None, None);
        let payload = UpdateCompanyPayload {
            name: Some("  Nova   Acme ".into()),
            ..Default::default()
        };
        let changes = compute_field_changes(&current, &payload).unwrap();
        assert_eq!(
            changes.name,
            Some(("Nova   Acme".to_string(), "nova acme".to_string()))
        );
    }

    #[test]
    fn mudanca_so_de_grafia_ainda_escreve_a_exibicao() {
        // "ACME INC" normaliza igual, mas a grafia de exibição mudou.
        let current = company("Acme Inc", None, None);
        let payload = UpdateCompanyPayload {
            name: Some("ACME INC".into()),
            ..Default::default()
        };
        let changes = compute_field_changes(&current, &payload).unwrap();
        let (display, normalized) = changes.name.unwrap();
        assert_eq!(display, "ACME INC");
        assert_eq!(normalized, current.normalized_name);
    }

    #[test]
    fn nome_que_normaliza_vazio_e_rejeitado() {
        let current = company("Acme Inc", None, None);
        let payload = UpdateCompanyPayload {
            name: Some("   ".into()),
            ..Default::default()
        };
        assert!(matches!(
            compute_field_changes(&current, &payload),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn descricao_diferente_entra_no_diff() {
        let current = company("Acme Inc", Some("antiga"), None);
        let payload = UpdateCompanyPayload {
            description: Some("nova".into()),
            ..Default::default()
        };
        let changes = compute_field_changes(&current, &payload).unwrap();
        assert_eq!(changes.description, Some(Some("nova".to_string())));
    }

    // --- decide_logo ---

    #[test]
    fn logo_inalterado_mantem() {
        assert_eq!(
            decide_logo(Some("/assets/x"), &LogoPatch::Unchanged),
            LogoDecision::Keep
        );
        assert_eq!(decide_logo(None, &LogoPatch::Unchanged), LogoDecision::Keep);
    }

    #[test]
    fn remover_com_ativo_existente_limpa_e_apaga() {
        assert_eq!(
            decide_logo(Some("/assets/x"), &LogoPatch::Remove),
            LogoDecision::Clear { delete_asset: true }
        );
    }

    #[test]
    fn remover_sem_ativo_e_noop() {
        assert_eq!(decide_logo(None, &LogoPatch::Remove), LogoDecision::Keep);
    }

    #[test]
    fn referencia_igual_a_atual_nao_escreve() {
        assert_eq!(
            decide_logo(Some("https://cdn/x.png"), &LogoPatch::Reference("https://cdn/x.png".into())),
            LogoDecision::Keep
        );
    }

    #[test]
    fn referencia_nova_e_gravada_literal() {
        assert_eq!(
            decide_logo(Some("/assets/x"), &LogoPatch::Reference("https://cdn/y.png".into())),
            LogoDecision::SetReference("https://cdn/y.png".into())
        );
    }

    #[test]
    fn upload_sempre_sobe_os_bytes() {
        assert_eq!(
            decide_logo(Some("/assets/x"), &LogoPatch::Upload(b"png".to_vec())),
            LogoDecision::Upload(b"png".to_vec())
        );
    }

    // --- validate_normalized_name ---

    #[test]
    fn nome_normalizado_dentro_do_limite_passa() {
        assert!(validate_normalized_name("acme inc").is_ok());
        assert!(validate_normalized_name(&"a".repeat(255)).is_ok());
    }

    #[test]
    fn nome_normalizado_longo_demais_e_rejeitado() {
        assert!(validate_normalized_name(&"a".repeat(256)).is_err());
    }
}
