//! Repositório sobre SQLite
//!
//! Inclusão incremental: um `INSERT` por registro, leitura ordenada por `seq`.

use chrono::NaiveDateTime;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tokio::sync::Mutex;
use tracing::{error, info};

use super::{warn_if_out_of_order, RecordStore};
use crate::error::{SchemaError, StoreError, ValidationError};
use crate::models::{LossReason, Record, Submission, TIMESTAMP_FORMAT};
use crate::StoreConfig;

const SELECT_ALL: &str = "SELECT seq, Data_Registro, Tipo_Usuario, Origem, Tipo_Solicitacao, \
     Satisfacao, Resolvida, Perda_Volume, Motivo_Perda FROM registros ORDER BY seq ASC";

const INSERT: &str = "INSERT INTO registros (Data_Registro, Tipo_Usuario, Origem, \
     Tipo_Solicitacao, Satisfacao, Resolvida, Perda_Volume, Motivo_Perda) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

/// Repositório sobre a tabela `registros` do SQLite.
///
/// Cada inclusão é um único `INSERT`; a ordem de inserção vem de `seq`.
#[derive(Debug)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl SqliteRecordStore {
    /// Usa um pool já migrado
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Mutex::new(()),
        }
    }

    /// Abre o banco da configuração, aplicando as migrações pendentes
    pub async fn open(config: &StoreConfig) -> anyhow::Result<Self> {
        let pool = crate::init_db_pool(config).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl RecordStore for SqliteRecordStore {
    async fn load(&self) -> Result<Vec<Record>, StoreError> {
        let rows = sqlx::query(SELECT_ALL).fetch_all(&self.pool).await?;
        decode_rows(&rows)
    }

    async fn append(&self, record: Record) -> Result<Vec<Record>, StoreError> {
        let _guard = self.write_lock.lock().await;

        // tabela danificada aborta a transação antes do INSERT
        let mut transaction = self.pool.begin().await?;
        let rows = sqlx::query(SELECT_ALL).fetch_all(&mut *transaction).await?;
        let mut records = decode_rows(&rows)?;
        warn_if_out_of_order(records.last(), &record);

        sqlx::query(INSERT)
            .bind(record.registered_at_label())
            .bind(record.user_type().as_str())
            .bind(record.channel().as_str())
            .bind(record.request_type().as_str())
            .bind(record.satisfaction().as_str())
            .bind(record.resolution().as_str())
            .bind(record.volume_loss().as_str())
            .bind(record.loss_reason().as_str())
            .execute(&mut *transaction)
            .await?;
        transaction.commit().await?;

        records.push(record);
        info!("Registro adicionado ao SQLite ({} registros)", records.len());
        Ok(records)
    }
}

fn decode_rows(rows: &[SqliteRow]) -> Result<Vec<Record>, StoreError> {
    rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>().map_err(|e| {
        error!("Tabela registros não corresponde ao esquema: {}", e);
        e
    })
}

fn decode_row(row: &SqliteRow) -> Result<Record, StoreError> {
    let seq: i64 = row.try_get("seq")?;
    let stamp: String = row.try_get("Data_Registro")?;
    let user_type: String = row.try_get("Tipo_Usuario")?;
    let channel: String = row.try_get("Origem")?;
    let request_type: String = row.try_get("Tipo_Solicitacao")?;
    let satisfaction: String = row.try_get("Satisfacao")?;
    let resolution: String = row.try_get("Resolvida")?;
    let volume_loss: String = row.try_get("Perda_Volume")?;
    let loss_reason: String = row.try_get("Motivo_Perda")?;

    let malformed = |reason: String| SchemaError::MalformedRow {
        line: seq.max(0) as u64,
        reason,
    };

    let registered_at = NaiveDateTime::parse_from_str(&stamp, TIMESTAMP_FORMAT)
        .map_err(|e| malformed(format!("Data_Registro inválida {:?}: {}", stamp, e)))?;

    let submission = || -> Result<Submission, ValidationError> {
        Ok(Submission {
            user_type: user_type.parse()?,
            channel: channel.parse()?,
            request_type: request_type.parse()?,
            satisfaction: satisfaction.parse()?,
            resolution: resolution.parse()?,
            volume_loss: volume_loss.parse()?,
            loss_reason: LossReason::from_stored(&loss_reason)?,
        })
    };

    submission()
        .and_then(|submission| Record::new(registered_at, submission))
        .map_err(|e| malformed(e.to_string()).into())
}
