//! Repositório append-only de registros
//!
//! O contrato é o mesmo para qualquer backend: `load` devolve todos os
//! registros na ordem de inserção e `append` acrescenta um registro depois
//! dos existentes, devolvendo a coleção atualizada. Não há atualização nem
//! remoção.

use std::future::Future;

use tracing::warn;

use crate::error::StoreError;
use crate::models::Record;

mod csv_store;
mod sqlite_store;

pub use csv_store::CsvRecordStore;
pub use sqlite_store::SqliteRecordStore;

/// Armazenamento persistente dos registros de atendimento
pub trait RecordStore: Send + Sync {
    /// Todos os registros persistidos, na ordem de inserção.
    ///
    /// Um armazenamento que nunca recebeu dados devolve uma coleção vazia.
    fn load(&self) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send;

    /// Acrescenta `record` de forma durável e devolve a coleção completa.
    fn append(&self, record: Record) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send;
}

/// Backend escolhido em tempo de execução pela configuração
#[derive(Debug)]
pub enum Backend {
    Csv(CsvRecordStore),
    Sqlite(SqliteRecordStore),
}

impl RecordStore for Backend {
    async fn load(&self) -> Result<Vec<Record>, StoreError> {
        match self {
            Backend::Csv(store) => store.load().await,
            Backend::Sqlite(store) => store.load().await,
        }
    }

    async fn append(&self, record: Record) -> Result<Vec<Record>, StoreError> {
        match self {
            Backend::Csv(store) => store.append(record).await,
            Backend::Sqlite(store) => store.append(record).await,
        }
    }
}

/// A coleção deveria ser cronológica; um relógio que volta no tempo só é registrado.
pub(crate) fn warn_if_out_of_order(previous: Option<&Record>, record: &Record) {
    if let Some(previous) = previous {
        if record.registered_at() < previous.registered_at() {
            warn!(
                "Data_Registro {} anterior ao último registro ({}); ordem de inserção mantida",
                record.registered_at_label(),
                previous.registered_at_label()
            );
        }
    }
}
