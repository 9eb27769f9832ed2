// src/services/asset_store.rs

// Porta do armazenamento de ativos (logos). O núcleo consome este contrato;
// a mecânica de imagem em si fica fora. `delete` em chave inexistente devolve
// `NotFound` -- quem chama decide se tolera a dupla exclusão.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetStoreError {
    #[error("ativo não encontrado")]
    NotFound,

    #[error("falha de E/S no armazenamento de ativos: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Grava os bytes sob a chave do recurso e devolve a referência pública.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String, AssetStoreError>;

    /// Remove o ativo da chave. `NotFound` quando não há nada armazenado.
    async fn delete(&self, key: &str) -> Result<(), AssetStoreError>;
}

/// Implementação padrão sobre o sistema de arquivos local.
pub struct LocalAssetStore {
    root: PathBuf,
}

impl LocalAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String, AssetStoreError> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.path_for(key), bytes).await?;
        Ok(format!("/assets/{}", key))
    }

    async fn delete(&self, key: &str) -> Result<(), AssetStoreError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AssetStoreError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_grava_e_devolve_referencia() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path());

        let reference = store.put("empresa-1", b"png-bytes").await.unwrap();
        assert_eq!(reference, "/assets/empresa-1");

        let written = tokio::fs::read(dir.path().join("empresa-1")).await.unwrap();
        assert_eq!(written, b"png-bytes");
    }

    #[tokio::test]
    async fn put_sobrescreve_a_mesma_chave() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path());

        store.put("chave", b"v1").await.unwrap();
        store.put("chave", b"v2").await.unwrap();

        let written = tokio::fs::read(dir.path().join("chave")).await.unwrap();
        assert_eq!(written, b"v2");
    }

    #[tokio::test]
    async fn delete_remove_e_segunda_chamada_da_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path());

        store.put("chave", b"bytes").await.unwrap();
        store.delete("chave").await.unwrap();

        match store.delete("chave").await {
            Err(AssetStoreError::NotFound) => {}
            other => panic!("esperava NotFound, veio {:?}", other),
        }
    }

    #[tokio::test]
    async fn delete_de_chave_nunca_gravada_da_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path());

        match store.delete("inexistente").await {
            Err(AssetStoreError::NotFound) => {}
            other => panic!("esperava NotFound, veio {:?}", other),
        }
    }
}
