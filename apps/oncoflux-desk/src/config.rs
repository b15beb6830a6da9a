//! Configuração do serviço a partir de variáveis de ambiente

use std::net::SocketAddr;
use std::path::PathBuf;

use oncoflux_db::{StoreConfig, StoreKind};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Valor inválido em {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Configuração completa do serviço da recepção
#[derive(Debug, Clone)]
pub struct DeskConfig {
    pub addr: SocketAddr,
    pub store: StoreConfig,
    /// Logs em JSON em vez do formato legível
    pub log_json: bool,
}

impl DeskConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Monta a configuração com uma função de consulta, para testes sem ambiente global
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind: StoreKind = parse_or(&lookup, "ONCOFLUX_BACKEND", StoreKind::Csv)?;
        let data_path = lookup("ONCOFLUX_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| kind.default_path());
        let max_connections = parse_or(&lookup, "ONCOFLUX_MAX_CONNECTIONS", StoreConfig::default().max_connections)?;
        let addr = parse_or(&lookup, "ONCOFLUX_ADDR", SocketAddr::from(([127, 0, 0, 1], 8501)))?;
        let log_json = parse_or(&lookup, "ONCOFLUX_LOG_JSON", false)?;

        Ok(Self {
            addr,
            store: StoreConfig {
                kind,
                data_path,
                max_connections,
            },
            log_json,
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DeskConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.addr, "127.0.0.1:8501".parse::<SocketAddr>().unwrap());
        assert_eq!(config.store.kind, StoreKind::Csv);
        assert_eq!(config.store.data_path, PathBuf::from("data/oncoflux_db.csv"));
        assert_eq!(config.store.max_connections, 5);
        assert!(!config.log_json);
    }

    #[test]
    fn test_sqlite_backend_gets_its_own_default_path() {
        let config = DeskConfig::from_lookup(lookup(&[("ONCOFLUX_BACKEND", "sqlite")])).unwrap();
        assert_eq!(config.store.kind, StoreKind::Sqlite);
        assert_eq!(config.store.data_path, PathBuf::from("data/oncoflux.db"));
    }

    #[test]
    fn test_overrides() {
        let config = DeskConfig::from_lookup(lookup(&[
            ("ONCOFLUX_DATA_PATH", "/var/lib/oncoflux/registros.csv"),
            ("ONCOFLUX_ADDR", "0.0.0.0:9000"),
            ("ONCOFLUX_LOG_JSON", "true"),
            ("ONCOFLUX_MAX_CONNECTIONS", "1"),
        ]))
        .unwrap();
        assert_eq!(config.store.data_path, PathBuf::from("/var/lib/oncoflux/registros.csv"));
        assert_eq!(config.addr.port(), 9000);
        assert!(config.log_json);
        assert_eq!(config.store.max_connections, 1);
    }

    #[test]
    fn test_invalid_value_is_an_error() {
        let err = DeskConfig::from_lookup(lookup(&[("ONCOFLUX_ADDR", "porta-errada")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "ONCOFLUX_ADDR", .. }));

        let err = DeskConfig::from_lookup(lookup(&[("ONCOFLUX_BACKEND", "planilha")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "ONCOFLUX_BACKEND", .. }));
    }
}
