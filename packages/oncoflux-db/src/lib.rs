//! OncoFlux DB - Registro de atendimentos da recepção e dashboard da diretoria
//!
//! Esta biblioteca fornece:
//! - Modelos do formulário de registro diário com domínios fechados
//! - Repositório append-only de registros (CSV ou SQLite)
//! - Migrações automáticas do backend SQLite
//! - Agregação dos indicadores do dashboard

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use tracing::info;

pub mod dashboard;
pub mod error;
pub mod migrations;
pub mod models;
pub mod service;
pub mod store;
pub mod validation;

pub use dashboard::{summarize, LossEntry, Summary};
pub use error::{SchemaError, StoreError, ValidationError};
pub use models::{FormOptions, Record, Submission, SubmissionForm};
pub use service::OncoFlux;
pub use store::{Backend, CsvRecordStore, RecordStore, SqliteRecordStore};

/// Backend de persistência dos registros
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Tabela CSV regravada a cada inclusão
    Csv,
    /// Banco SQLite com inclusão incremental
    Sqlite,
}

impl StoreKind {
    /// Caminho padrão do arquivo de dados para este backend
    pub fn default_path(&self) -> PathBuf {
        match self {
            StoreKind::Csv => PathBuf::from("data/oncoflux_db.csv"),
            StoreKind::Sqlite => PathBuf::from("data/oncoflux.db"),
        }
    }
}

impl std::str::FromStr for StoreKind {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "csv" => Ok(StoreKind::Csv),
            "sqlite" => Ok(StoreKind::Sqlite),
            other => Err(format!("Backend desconhecido: {}", other)),
        }
    }
}

/// Configuração do armazenamento dos registros
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backend escolhido
    pub kind: StoreKind,
    /// Arquivo CSV ou arquivo do banco SQLite
    pub data_path: PathBuf,
    /// Número máximo de conexões no pool (apenas SQLite)
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Csv,
            data_path: StoreKind::Csv.default_path(),
            max_connections: 5,
        }
    }
}

/// Abre o repositório configurado
pub async fn open_store(config: &StoreConfig) -> Result<Backend> {
    match config.kind {
        StoreKind::Csv => {
            info!("Registros em CSV: {}", config.data_path.display());
            Ok(Backend::Csv(CsvRecordStore::new(&config.data_path)))
        }
        StoreKind::Sqlite => Ok(Backend::Sqlite(SqliteRecordStore::open(config).await?)),
    }
}

/// Inicializa uma conexão com o banco de dados SQLite e aplica as migrações
pub async fn init_db_pool(config: &StoreConfig) -> Result<SqlitePool> {
    let db_path = Path::new(&config.data_path);

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .context("Falha ao criar diretório para banco de dados")?;
        }
    }

    let connection_options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .pragma("synchronous", "FULL");

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(connection_options)
        .await
        .context("Falha ao conectar ao banco de dados SQLite")?;

    migrations::run_migrations(&pool)
        .await
        .context("Falha ao aplicar migrações")?;

    info!("Banco de dados inicializado com sucesso: {}", db_path.display());
    Ok(pool)
}
