//! Tabela CSV regravada por inteiro a cada inclusão
//!
//! Formato: cabeçalho com as colunas de [`COLUMNS`], uma linha por registro,
//! UTF-8, separado por vírgulas. Arquivo ausente equivale a tabela vazia.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{error, info};

use super::{warn_if_out_of_order, RecordStore};
use crate::error::{SchemaError, StoreError};
use crate::models::{Record, COLUMNS};

/// Repositório sobre um arquivo CSV local
#[derive(Debug)]
pub struct CsvRecordStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<Record>, StoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        decode_table(&bytes).map_err(|e| {
            error!("Tabela {} não corresponde ao esquema: {}", self.path.display(), e);
            e.into()
        })
    }
}

impl RecordStore for CsvRecordStore {
    async fn load(&self) -> Result<Vec<Record>, StoreError> {
        self.read_all().await
    }

    async fn append(&self, record: Record) -> Result<Vec<Record>, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.read_all().await?;
        warn_if_out_of_order(records.last(), &record);
        records.push(record);

        let bytes = encode_table(&records)?;
        replace_file(&self.path, &bytes).await?;

        info!(
            "Registro adicionado a {} ({} registros)",
            self.path.display(),
            records.len()
        );
        Ok(records)
    }
}

fn decode_table(bytes: &[u8]) -> Result<Vec<Record>, SchemaError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers = reader.headers().map_err(malformed)?.clone();
    if !headers.iter().eq(COLUMNS) {
        return Err(SchemaError::HeaderMismatch {
            expected: COLUMNS.iter().map(|c| c.to_string()).collect(),
            found: headers.iter().map(str::to_string).collect(),
        });
    }

    reader
        .deserialize::<Record>()
        .map(|row| row.map_err(malformed))
        .collect()
}

fn malformed(err: csv::Error) -> SchemaError {
    let line = err.position().map(|pos| pos.line()).unwrap_or_default();
    SchemaError::MalformedRow {
        line,
        reason: err.to_string(),
    }
}

fn encode_table(records: &[Record]) -> io::Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.into_inner().map_err(|e| e.into_error())
}

/// Grava em um arquivo temporário ao lado do destino e renomeia por cima.
///
/// Leitores veem a tabela antiga ou a nova, nunca uma gravação pela metade.
async fn replace_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let tmp = temp_path(path);
    let mut file = fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    sync_parent(path).await
}

/// Persiste a entrada do diretório após o `rename`
#[cfg(unix)]
async fn sync_parent(path: &Path) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::File::open(parent).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_parent(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("oncoflux_db.csv"));
    name.push(".tmp");
    path.with_file_name(name)
}
