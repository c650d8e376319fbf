use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

/// Open the shared connection pool. Schema setup belongs to each service.
pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;
    tracing::info!(
        "Connected to {:?} database",
        db.get_database_backend()
    );
    Ok(db)
}

/// Round-trip a trivial query.
pub async fn ping(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "SELECT 1".to_owned(),
    ))
    .await?;
    Ok(())
}
