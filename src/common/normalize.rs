// src/common/normalize.rs

// Normalização de nomes de empresa: a forma normalizada é o que o índice
// único compara; a grafia original fica preservada para exibição.

/// Reduz um nome à sua forma canônica: apara as pontas, colapsa sequências
/// internas de espaços em um único espaço e converte para minúsculas.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Forma de exibição: só apara as pontas, mantendo grafia e espaçamento internos.
pub fn display_name(raw: &str) -> &str {
    raw.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colapsa_espacos_e_minusculas() {
        assert_eq!(normalize_name("  Acme   Inc "), "acme inc");
        assert_eq!(normalize_name("ACME INC"), "acme inc");
    }

    #[test]
    fn grafias_diferentes_normalizam_igual() {
        assert_eq!(normalize_name("  Acme   Inc "), normalize_name("ACME INC"));
    }

    #[test]
    fn nome_vazio_ou_so_espacos_normaliza_para_vazio() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   \t  "), "");
    }

    #[test]
    fn unicode_e_minusculizado() {
        assert_eq!(normalize_name("Café  DA Esquina"), "café da esquina");
    }

    #[test]
    fn exibicao_preserva_grafia_interna() {
        assert_eq!(display_name("  Acme   Inc "), "Acme   Inc");
    }
}
