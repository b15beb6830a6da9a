//! Definições de erro para a biblioteca oncoflux-db
//!
//! Três famílias de falha chegam ao chamador:
//! - [`ValidationError`]: submissão fora do domínio, nada é persistido
//! - [`SchemaError`]: dados persistidos não batem com o layout fixo de colunas
//! - [`StoreError::Storage`]: falha de E/S repassada sem tratamento

use thiserror::Error;

/// Erros de validação de uma submissão do formulário
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Valor inválido para {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Motivo_Perda é obrigatório quando houve perda de volume")]
    MissingLossReason,

    #[error("Motivo_Perda deve ser \"N/A\" quando não houve perda de volume (recebido {reason:?})")]
    UnexpectedLossReason { reason: String },
}

/// Dados persistidos que não correspondem ao esquema fixo
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Cabeçalho inesperado: esperado {expected:?}, encontrado {found:?}")]
    HeaderMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Linha {line} malformada: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("Tabela incompatível: {0}")]
    IncompatibleTable(String),
}

/// Erros das operações do repositório de registros
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Erro de armazenamento: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Erro de banco de dados: {0}")]
    Database(String),
}

impl StoreError {
    /// Indica se o erro pode ser corrigido por quem submeteu o formulário
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

/// Conversão de erros específicos do SQLx para nossos tipos de erro
impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::Io(io_err) => StoreError::Storage(io_err),
            sqlx::Error::ColumnNotFound(col) => {
                SchemaError::IncompatibleTable(format!("Coluna não encontrada: {}", col)).into()
            }
            sqlx::Error::TypeNotFound { type_name } => {
                SchemaError::IncompatibleTable(format!("Tipo não encontrado: {}", type_name)).into()
            }
            sqlx::Error::ColumnDecode { index, source } => SchemaError::IncompatibleTable(format!(
                "Erro ao decodificar coluna {}: {}",
                index, source
            ))
            .into(),
            sqlx::Error::Decode(source) => {
                SchemaError::IncompatibleTable(format!("Erro de decodificação: {}", source)).into()
            }
            sqlx::Error::Database(dbe) => StoreError::Database(dbe.message().to_string()),
            sqlx::Error::PoolClosed => {
                StoreError::Database("Pool de conexões fechado".to_string())
            }
            sqlx::Error::PoolTimedOut => {
                StoreError::Database("Timeout no pool de conexões".to_string())
            }
            other => StoreError::Database(format!("Erro inesperado: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_keep_their_kind() {
        let err: StoreError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "negado").into();
        match err {
            StoreError::Storage(inner) => {
                assert_eq!(inner.kind(), std::io::ErrorKind::PermissionDenied)
            }
            other => panic!("esperado Storage, obtido {other:?}"),
        }
    }

    #[test]
    fn test_sqlx_column_errors_are_schema_errors() {
        let err: StoreError = sqlx::Error::ColumnNotFound("Origem".to_string()).into();
        assert!(matches!(err, StoreError::Schema(SchemaError::IncompatibleTable(_))));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_validation_message_names_field() {
        let err = ValidationError::InvalidValue {
            field: "Origem",
            value: "Fax".to_string(),
        };
        assert_eq!(err.to_string(), "Valor inválido para Origem: \"Fax\"");
    }
}
