//! Sistema de migrações para o backend SQLite
//!
//! A versão aplicada fica em `PRAGMA user_version`.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::info;

/// Lista de migrações SQL a serem aplicadas
pub(crate) const MIGRATIONS: &[&str] = &[
    // 001_registros.sql
    r#"
    CREATE TABLE IF NOT EXISTS registros (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        Data_Registro TEXT NOT NULL,
        Tipo_Usuario TEXT NOT NULL CHECK (Tipo_Usuario IN ('Paciente', 'Familiar', 'Médico Externo', 'Staff Interno')),
        Origem TEXT NOT NULL CHECK (Origem IN ('Pessoal', 'WhatsApp', 'Telefone', 'E-mail')),
        Tipo_Solicitacao TEXT NOT NULL CHECK (Tipo_Solicitacao IN (
            'Agendamento/Reagendamento', 'Confirmação de Tratamento', 'Crise/Conflito',
            'Documentação/Convênio', 'Dúvida de Fluxo/Logística', 'Outro'
        )),
        Satisfacao TEXT NOT NULL DEFAULT '3-Neutro' CHECK (Satisfacao IN ('1-Crítico', '2-Ruim', '3-Neutro', '4-Bom', '5-Excelente')),
        Resolvida TEXT NOT NULL CHECK (Resolvida IN ('Sim', 'Não (Pendência)')),
        Perda_Volume TEXT NOT NULL CHECK (Perda_Volume IN ('Não', 'Sim (Perda de Volume)')),
        Motivo_Perda TEXT NOT NULL DEFAULT 'N/A' CHECK (Motivo_Perda IN (
            'Cobertura/Convênio', 'Agenda Indisponível', 'Preço', 'Preferência Médica', 'Distância', 'N/A'
        )),
        -- N/A exatamente quando não houve perda
        CHECK ((Perda_Volume = 'Não') = (Motivo_Perda = 'N/A'))
    )
    "#,
];

/// Executa todas as migrações pendentes no banco de dados
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Aplicando migrações de banco de dados...");

    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await
        .context("Falha ao obter versão do banco")?;

    info!("Versão atual do banco: {}", version);

    for (i, migration_sql) in MIGRATIONS.iter().enumerate() {
        let migration_version = (i + 1) as i64;

        if migration_version <= version {
            info!("Migração {} já aplicada", migration_version);
            continue;
        }

        info!("Aplicando migração {}...", migration_version);

        let mut transaction = pool
            .begin()
            .await
            .with_context(|| format!("Falha ao iniciar transação para migração {}", migration_version))?;

        sqlx::query(migration_sql)
            .execute(&mut *transaction)
            .await
            .with_context(|| format!("Falha ao executar migração {}", migration_version))?;

        sqlx::query(&format!("PRAGMA user_version = {}", migration_version))
            .execute(&mut *transaction)
            .await
            .with_context(|| format!("Falha ao atualizar versão para {}", migration_version))?;

        transaction
            .commit()
            .await
            .with_context(|| format!("Falha ao confirmar transação para migração {}", migration_version))?;

        info!("Migração {} aplicada com sucesso", migration_version);
    }

    info!("Migrações concluídas. Versão atual: {}", MIGRATIONS.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::migrate::MigrateDatabase;
    use sqlx::sqlite::SqliteConnectOptions;
    use sqlx::Sqlite;
    use tempfile::tempdir;

    async fn scratch_pool(name: &str) -> Result<(tempfile::TempDir, SqlitePool)> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join(name);
        let db_url = format!("sqlite:{}", db_path.display());

        Sqlite::create_database(&db_url).await?;

        let conn_options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(conn_options).await?;
        Ok((temp_dir, pool))
    }

    #[tokio::test]
    async fn test_migrations() -> Result<()> {
        let (_temp_dir, pool) = scratch_pool("test_migrations.db").await?;

        run_migrations(&pool).await?;

        let version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&pool)
            .await?;
        assert_eq!(version, MIGRATIONS.len() as i64);

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_all(&pool)
        .await?;
        assert!(tables.contains(&"registros".to_string()));

        // segunda execução não reaplica nada
        run_migrations(&pool).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_unreadable_version_aborts_migrations() -> Result<()> {
        let (_temp_dir, pool) = scratch_pool("test_closed.db").await?;
        pool.close().await;

        let err = run_migrations(&pool).await.unwrap_err();
        assert!(err.to_string().contains("Falha ao obter versão do banco"));
        Ok(())
    }

    #[tokio::test]
    async fn test_table_rejects_inconsistent_loss_reason() -> Result<()> {
        let (_temp_dir, pool) = scratch_pool("test_check.db").await?;
        run_migrations(&pool).await?;

        let result = sqlx::query(
            "INSERT INTO registros (Data_Registro, Tipo_Usuario, Origem, Tipo_Solicitacao, Satisfacao, Resolvida, Perda_Volume, Motivo_Perda)
             VALUES ('2024-05-17 10:00:00', 'Paciente', 'Pessoal', 'Outro', '3-Neutro', 'Sim', 'Não', 'Preço')",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());

        let result = sqlx::query(
            "INSERT INTO registros (Data_Registro, Tipo_Usuario, Origem, Tipo_Solicitacao, Satisfacao, Resolvida, Perda_Volume, Motivo_Perda)
             VALUES ('2024-05-17 10:00:00', 'Paciente', 'Fax', 'Outro', '3-Neutro', 'Sim', 'Não', 'N/A')",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());
        Ok(())
    }
}
