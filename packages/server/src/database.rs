use std::time::Duration;

use sea_orm::*;
use sea_query::{Index, MysqlQueryBuilder, PostgresQueryBuilder, SqliteQueryBuilder};
use tracing::{info, warn};

use crate::entity::file_record;

pub async fn init_db(db_url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("server::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

/// Create secondary indexes the entity attributes cannot express.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Composite index for owner listings:
    // SELECT ... FROM file_record WHERE owner_id = ? ORDER BY created_at DESC
    let index = Index::create()
        .if_not_exists()
        .name("idx_file_record_owner_created")
        .table(file_record::Entity)
        .col(file_record::Column::OwnerId)
        .col(file_record::Column::CreatedAt)
        .to_owned();

    let stmt = match db.get_database_backend() {
        DbBackend::Postgres => index.to_string(PostgresQueryBuilder),
        DbBackend::Sqlite => index.to_string(SqliteQueryBuilder),
        _ => index.to_string(MysqlQueryBuilder),
    };

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_file_record_owner_created exists");
        }
        Err(e) => {
            warn!(error = %e, "Failed to create index idx_file_record_owner_created");
        }
    }

    Ok(())
}
