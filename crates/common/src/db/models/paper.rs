//! Paper entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "papers")]
pub struct Model {
    /// Insertion sequence; defines store order and never leaves the service
    #[sea_orm(primary_key)]
    #[serde(skip)]
    pub seq: i32,

    /// Public identifier assigned on creation
    #[sea_orm(unique)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub unit_code: String,

    /// Kept as text, e.g. "2023" or "2022/23"
    #[sea_orm(column_type = "Text")]
    pub year_taken: String,

    #[sea_orm(column_type = "Text")]
    pub unit_title: String,

    /// Opaque reference to wherever the file lives
    #[sea_orm(column_type = "Text")]
    pub file_location: String,

    #[sea_orm(column_type = "Text")]
    pub class_of_study: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
