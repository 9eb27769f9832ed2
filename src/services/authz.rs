// src/services/authz.rs

// O avaliador de autorização: quatro gates puros e compostos sobre
// (principal, projeção do recurso). Nenhum gate tem efeito colateral;
// quem chama traduz a negação para a falha visível apropriada.
//
// Contrato de ordem para operações de módulo sobre uma filial:
//   role_gate -> branch_access_gate -> permission_gate
// cada um em curto-circuito. Toda negação é terminal, sem retry.

use std::fmt;

use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::lookup_repo::{BranchProjection, LookupRepository, OwnerProjection};
use crate::models::identity::{IdentityContext, PermissionAction, PermissionModule, Role};

/// Motivo da negação. As famílias não se misturam: "não é seu" (dono),
/// "não é sua filial" (atribuição) e "permissão ausente" pedem ações
/// corretivas diferentes de quem chama a API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    RoleNotAllowed,
    NotOwner,
    BranchMismatch,
    MissingPermission {
        module: PermissionModule,
        action: PermissionAction,
    },
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::RoleNotAllowed => {
                write!(f, "o papel da conta não permite esta ação")
            }
            DenyReason::NotOwner => write!(f, "a empresa não pertence a esta conta"),
            DenyReason::BranchMismatch => {
                write!(f, "a filial não é a filial atribuída a esta conta")
            }
            DenyReason::MissingPermission { module, action } => {
                write!(f, "é necessária a permissão '{}:{}'", module, action)
            }
        }
    }
}

/// Gate de papel: nega sem consultar recurso algum.
pub fn role_gate(allowed: &[Role], principal: &IdentityContext) -> Result<(), DenyReason> {
    if allowed.contains(&principal.role) {
        Ok(())
    } else {
        Err(DenyReason::RoleNotAllowed)
    }
}

/// Gate de posse: admin dono de uma empresa ativa.
pub fn ownership_gate(
    owner: &OwnerProjection,
    principal: &IdentityContext,
) -> Result<(), DenyReason> {
    if principal.role != Role::Admin {
        return Err(DenyReason::RoleNotAllowed);
    }
    if principal.user_id == owner.owner_id && owner.active {
        Ok(())
    } else {
        Err(DenyReason::NotOwner)
    }
}

/// Gate de atribuição: funcionário lotado exatamente nesta filial.
pub fn assignment_gate(
    branch: &BranchProjection,
    principal: &IdentityContext,
) -> Result<(), DenyReason> {
    if principal.role != Role::Employee {
        return Err(DenyReason::RoleNotAllowed);
    }
    if principal.assigned_branch_id == Some(branch.id) {
        Ok(())
    } else {
        Err(DenyReason::BranchMismatch)
    }
}

/// Gate composto de acesso à filial. Posse e atribuição continuam funções
/// separadas (as falhas significam coisas diferentes); aqui só se despacha
/// pela estratégia do papel -- um papel futuro entra como um novo braço.
pub fn branch_access_gate(
    principal: &IdentityContext,
    branch: &BranchProjection,
    owner: Option<&OwnerProjection>,
) -> Result<(), DenyReason> {
    match principal.role {
        Role::Admin => match owner {
            Some(owner) => ownership_gate(owner, principal),
            None => Err(DenyReason::NotOwner),
        },
        Role::Employee => assignment_gate(branch, principal),
        Role::Guest | Role::Operator => Err(DenyReason::RoleNotAllowed),
    }
}

/// Gate de permissão: admin passa incondicionalmente; funcionário consulta
/// a matriz já desserializada, fechada por padrão.
pub fn permission_gate(
    module: PermissionModule,
    action: PermissionAction,
    principal: &IdentityContext,
) -> Result<(), DenyReason> {
    match principal.role {
        Role::Admin => Ok(()),
        Role::Employee => {
            let allowed = principal
                .permissions
                .as_ref()
                .map(|matrix| matrix.allows(module, action))
                .unwrap_or(false);
            if allowed {
                Ok(())
            } else {
                Err(DenyReason::MissingPermission { module, action })
            }
        }
        Role::Guest | Role::Operator => Err(DenyReason::RoleNotAllowed),
    }
}

// ---
// Orquestração sobre a porta de consulta (Resource Lookup)
// ---

#[derive(Clone)]
pub struct AuthzService {
    lookup: LookupRepository,
}

impl AuthzService {
    pub fn new(lookup: LookupRepository) -> Self {
        Self { lookup }
    }

    /// Aplica o gate composto sobre uma filial. A projeção do dono só é
    /// buscada no caminho de admin; o caminho de funcionário decide apenas
    /// com a projeção da filial.
    pub async fn require_branch_access(
        &self,
        principal: &IdentityContext,
        branch_id: Uuid,
    ) -> Result<BranchProjection, AppError> {
        let branch = self
            .lookup
            .fetch_branch_projection(branch_id)
            .await?
            .ok_or(AppError::BranchNotFound)?;

        let owner = if principal.role == Role::Admin {
            self.lookup.fetch_owner_projection(branch.company_id).await?
        } else {
            None
        };

        branch_access_gate(principal, &branch, owner.as_ref())
            .map_err(AppError::AccessDenied)?;

        Ok(branch)
    }

    /// Posse de empresa para superfícies administrativas (criação/listagem
    /// de filiais, atribuição de funcionários).
    pub async fn require_company_ownership(
        &self,
        principal: &IdentityContext,
        company_id: Uuid,
    ) -> Result<(), AppError> {
        role_gate(&[Role::Admin], principal).map_err(AppError::AccessDenied)?;

        let owner = self
            .lookup
            .fetch_owner_projection(company_id)
            .await?
            .ok_or(AppError::CompanyNotFound)?;

        ownership_gate(&owner, principal).map_err(AppError::AccessDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::identity::{AccountState, ModuleActions, PermissionMatrix};

    fn admin(user_id: Uuid) -> IdentityContext {
        IdentityContext {
            user_id,
            role: Role::Admin,
            account_state: AccountState::Active,
            assigned_branch_id: None,
            permissions: None,
        }
    }

    fn employee(branch_id: Uuid, matrix: PermissionMatrix) -> IdentityContext {
        IdentityContext {
            user_id: Uuid::new_v4(),
            role: Role::Employee,
            account_state: AccountState::Active,
            assigned_branch_id: Some(branch_id),
            permissions: Some(matrix),
        }
    }

    fn principal_with_role(role: Role) -> IdentityContext {
        IdentityContext {
            user_id: Uuid::new_v4(),
            role,
            account_state: AccountState::Active,
            assigned_branch_id: None,
            permissions: None,
        }
    }

    fn branch(id: Uuid, company_id: Uuid) -> BranchProjection {
        BranchProjection { id, company_id, active: true }
    }

    fn matrix_products_edit() -> PermissionMatrix {
        let mut matrix = PermissionMatrix::default();
        matrix.0.insert(
            PermissionModule::Products,
            ModuleActions { can_edit: true, ..Default::default() },
        );
        matrix
    }

    // --- role_gate ---

    #[test]
    fn role_gate_nega_papel_fora_da_lista() {
        let guest = principal_with_role(Role::Guest);
        assert_eq!(
            role_gate(&[Role::Admin, Role::Employee], &guest),
            Err(DenyReason::RoleNotAllowed)
        );
        assert_eq!(role_gate(&[Role::Guest], &guest), Ok(()));
    }

    // --- ownership_gate ---

    #[test]
    fn posse_exige_admin_dono_de_empresa_ativa() {
        let owner_id = Uuid::new_v4();
        let projection = OwnerProjection { owner_id, active: true };

        assert_eq!(ownership_gate(&projection, &admin(owner_id)), Ok(()));
        assert_eq!(
            ownership_gate(&projection, &admin(Uuid::new_v4())),
            Err(DenyReason::NotOwner)
        );
    }

    #[test]
    fn posse_nega_empresa_arquivada_mesmo_para_o_dono() {
        let owner_id = Uuid::new_v4();
        let projection = OwnerProjection { owner_id, active: false };
        assert_eq!(
            ownership_gate(&projection, &admin(owner_id)),
            Err(DenyReason::NotOwner)
        );
    }

    #[test]
    fn posse_nega_quem_nao_e_admin() {
        let owner_id = Uuid::new_v4();
        let projection = OwnerProjection { owner_id, active: true };
        let mut employee = employee(Uuid::new_v4(), PermissionMatrix::default());
        employee.user_id = owner_id; // mesmo "dono" por id, papel errado
        assert_eq!(
            ownership_gate(&projection, &employee),
            Err(DenyReason::RoleNotAllowed)
        );
    }

    // --- assignment_gate / branch_access_gate ---

    #[test]
    fn funcionario_acessa_apenas_a_filial_atribuida() {
        let branch_7 = branch(Uuid::new_v4(), Uuid::new_v4());
        let branch_8 = branch(Uuid::new_v4(), branch_7.company_id);
        let principal = employee(branch_7.id, matrix_products_edit());

        assert_eq!(branch_access_gate(&principal, &branch_7, None), Ok(()));
        assert_eq!(
            branch_access_gate(&principal, &branch_8, None),
            Err(DenyReason::BranchMismatch)
        );
    }

    #[test]
    fn atribuicao_ignora_o_conteudo_da_matriz() {
        // A matriz não participa da decisão de atribuição: mesmo vazia,
        // a filial correta é acessível; mesmo cheia, a errada não é.
        let branch_ok = branch(Uuid::new_v4(), Uuid::new_v4());
        let branch_err = branch(Uuid::new_v4(), branch_ok.company_id);

        let sem_permissoes = employee(branch_ok.id, PermissionMatrix::default());
        assert_eq!(branch_access_gate(&sem_permissoes, &branch_ok, None), Ok(()));

        let com_permissoes = employee(branch_ok.id, matrix_products_edit());
        assert_eq!(
            branch_access_gate(&com_permissoes, &branch_err, None),
            Err(DenyReason::BranchMismatch)
        );
    }

    #[test]
    fn papeis_sem_estrategia_sao_sempre_negados() {
        let alvo = branch(Uuid::new_v4(), Uuid::new_v4());
        let owner = OwnerProjection { owner_id: Uuid::new_v4(), active: true };

        for role in [Role::Guest, Role::Operator] {
            let principal = principal_with_role(role);
            assert_eq!(
                branch_access_gate(&principal, &alvo, Some(&owner)),
                Err(DenyReason::RoleNotAllowed)
            );
        }
    }

    #[test]
    fn admin_sem_projecao_de_dono_e_negado() {
        let alvo = branch(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(
            branch_access_gate(&admin(Uuid::new_v4()), &alvo, None),
            Err(DenyReason::NotOwner)
        );
    }

    #[test]
    fn admin_dono_passa_pelo_gate_composto() {
        let owner_id = Uuid::new_v4();
        let alvo = branch(Uuid::new_v4(), Uuid::new_v4());
        let owner = OwnerProjection { owner_id, active: true };
        assert_eq!(
            branch_access_gate(&admin(owner_id), &alvo, Some(&owner)),
            Ok(())
        );
    }

    // --- permission_gate ---

    #[test]
    fn admin_passa_incondicionalmente_pelo_gate_de_permissao() {
        let principal = admin(Uuid::new_v4());
        for module in [
            PermissionModule::Products,
            PermissionModule::Categories,
            PermissionModule::BranchInfo,
        ] {
            for action in [
                PermissionAction::View,
                PermissionAction::Create,
                PermissionAction::Edit,
                PermissionAction::Delete,
            ] {
                assert_eq!(permission_gate(module, action, &principal), Ok(()));
            }
        }
    }

    #[test]
    fn funcionario_so_passa_com_flag_explicita() {
        let principal = employee(Uuid::new_v4(), matrix_products_edit());

        assert_eq!(
            permission_gate(PermissionModule::Products, PermissionAction::Edit, &principal),
            Ok(())
        );
        // Flag não marcada no módulo presente
        assert_eq!(
            permission_gate(PermissionModule::Products, PermissionAction::Delete, &principal),
            Err(DenyReason::MissingPermission {
                module: PermissionModule::Products,
                action: PermissionAction::Delete,
            })
        );
        // Módulo ausente da matriz: fechado por padrão
        assert_eq!(
            permission_gate(PermissionModule::Categories, PermissionAction::Delete, &principal),
            Err(DenyReason::MissingPermission {
                module: PermissionModule::Categories,
                action: PermissionAction::Delete,
            })
        );
    }

    #[test]
    fn gate_de_permissao_nega_papeis_sem_matriz() {
        for role in [Role::Guest, Role::Operator] {
            let principal = principal_with_role(role);
            assert_eq!(
                permission_gate(PermissionModule::Products, PermissionAction::View, &principal),
                Err(DenyReason::RoleNotAllowed)
            );
        }
    }

    // --- cenário completo do contrato de ordem ---

    #[test]
    fn cadeia_completa_para_funcionario_de_filial() {
        // Principal: funcionário da filial A com products.canEdit
        let filial_a = branch(Uuid::new_v4(), Uuid::new_v4());
        let filial_b = branch(Uuid::new_v4(), filial_a.company_id);
        let principal = employee(filial_a.id, matrix_products_edit());

        // Edição de produto na filial atribuída: permitido
        assert_eq!(role_gate(&[Role::Admin, Role::Employee], &principal), Ok(()));
        assert_eq!(branch_access_gate(&principal, &filial_a, None), Ok(()));
        assert_eq!(
            permission_gate(PermissionModule::Products, PermissionAction::Edit, &principal),
            Ok(())
        );

        // Mesma ação em outra filial: negado com motivo de filial
        assert_eq!(
            branch_access_gate(&principal, &filial_b, None),
            Err(DenyReason::BranchMismatch)
        );

        // Exclusão de categoria sem a chave na matriz: negado com motivo de permissão
        assert_eq!(
            permission_gate(PermissionModule::Categories, PermissionAction::Delete, &principal),
            Err(DenyReason::MissingPermission {
                module: PermissionModule::Categories,
                action: PermissionAction::Delete,
            })
        );
    }
}
