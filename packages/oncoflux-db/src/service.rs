//! Ponto de entrada usado pela camada de apresentação

use chrono::{Local, NaiveDateTime};
use tracing::info;

use crate::dashboard::{summarize, Summary};
use crate::error::StoreError;
use crate::models::{Record, Submission, SubmissionForm};
use crate::store::RecordStore;

/// Registro diário de fluxo sobre um repositório explícito
#[derive(Debug)]
pub struct OncoFlux<S> {
    store: S,
}

impl<S: RecordStore> OncoFlux<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Valida e grava a submissão com o horário local do servidor
    pub async fn submit(&self, form: &SubmissionForm) -> Result<Record, StoreError> {
        self.submit_at(form, Local::now().naive_local()).await
    }

    /// Valida e grava a submissão com um horário explícito
    pub async fn submit_at(&self, form: &SubmissionForm, at: NaiveDateTime) -> Result<Record, StoreError> {
        let submission = Submission::try_from(form)?;
        let record = Record::new(at, submission)?;
        let records = self.store.append(record.clone()).await?;
        info!(
            "Novo registro: {} / {} ({} no total)",
            record.request_type(),
            record.satisfaction(),
            records.len()
        );
        Ok(record)
    }

    pub async fn records(&self) -> Result<Vec<Record>, StoreError> {
        self.store.load().await
    }

    /// Carrega todos os registros e agrega o dashboard
    pub async fn summary(&self) -> Result<Summary, StoreError> {
        let records = self.store.load().await?;
        Ok(summarize(&records))
    }
}
