//! Agregação do dashboard da diretoria
//!
//! Tudo é recalculado a partir da coleção completa a cada leitura; não há
//! estado guardado entre chamadas.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::{timestamp, LossReason, Record, RequestType, Satisfaction};

/// Indicadores e distribuições derivados dos registros
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Total de atendimentos
    pub total: usize,
    /// Atendimentos com satisfação 1-Crítico
    pub critical_count: usize,
    /// Atendimentos com perda de volume
    pub loss_count: usize,
    /// Contagem por tipo de demanda; só aparecem tipos presentes
    pub demand_distribution: BTreeMap<RequestType, usize>,
    /// Contagem por nível de satisfação; só aparecem níveis presentes
    pub satisfaction_distribution: BTreeMap<Satisfaction, usize>,
    /// Perdas na ordem dos registros
    pub loss_detail: Vec<LossEntry>,
}

/// Linha do alerta de perdas
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LossEntry {
    #[serde(rename = "Data_Registro", serialize_with = "timestamp::serialize")]
    pub registered_at: NaiveDateTime,
    #[serde(rename = "Motivo_Perda")]
    pub loss_reason: LossReason,
    #[serde(rename = "Tipo_Solicitacao")]
    pub request_type: RequestType,
}

impl Summary {
    /// Nenhum registro ainda; não é um erro
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

pub fn summarize(records: &[Record]) -> Summary {
    let mut summary = Summary {
        total: records.len(),
        ..Summary::default()
    };

    for record in records {
        *summary
            .demand_distribution
            .entry(record.request_type())
            .or_insert(0) += 1;
        *summary
            .satisfaction_distribution
            .entry(record.satisfaction())
            .or_insert(0) += 1;

        if record.is_critical() {
            summary.critical_count += 1;
        }
        if record.is_loss() {
            summary.loss_count += 1;
            summary.loss_detail.push(LossEntry {
                registered_at: record.registered_at(),
                loss_reason: record.loss_reason(),
                request_type: record.request_type(),
            });
        }
    }

    summary
}
