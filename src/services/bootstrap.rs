// src/services/bootstrap.rs

use crate::models::identity::Role;

/// Política explícita de semeadura de papéis, decidida UMA vez no registro.
/// A primeira conta de um sistema vazio vira admin; as demais nascem como
/// guest e são promovidas por convite (funcionário) ou por ação de operador.
pub struct BootstrapPolicy;

impl BootstrapPolicy {
    pub fn role_for_new_account(is_first_account: bool) -> Role {
        if is_first_account {
            Role::Admin
        } else {
            Role::Guest
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primeira_conta_vira_admin() {
        assert_eq!(BootstrapPolicy::role_for_new_account(true), Role::Admin);
    }

    #[test]
    fn demais_contas_nascem_como_guest() {
        assert_eq!(BootstrapPolicy::role_for_new_account(false), Role::Guest);
    }
}
