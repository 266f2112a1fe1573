use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "access_level")]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[sea_orm(string_value = "READ")]
    Read,
    #[sea_orm(string_value = "WRITE")]
    Write,
    #[sea_orm(string_value = "FULL")]
    Full,
}

/// Delegated-access grant from an account owner to a ghostwriter. Ownership
/// never transfers; the grant is the only path to another user's notes.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ghostwriter_access")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub ghostwriter_id: i64,
    pub owner_id: i64,
    pub access_level: AccessLevel,
    pub is_active: bool,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
