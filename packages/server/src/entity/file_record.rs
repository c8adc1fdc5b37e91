use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file_record")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Public lookup key handed out in links.
    #[sea_orm(unique)]
    pub identifier: String,

    /// Transport user that uploaded the file.
    #[sea_orm(indexed)]
    pub owner_id: i64,

    pub display_name: String,

    pub size_bytes: i64,

    /// Provider-side path of the binary.
    #[sea_orm(column_type = "Text")]
    pub source_ref: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
