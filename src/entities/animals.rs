use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "animals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub animal_type: String,
    pub age: i32,
    pub gender: Option<String>,
    pub health_status: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub image_filename: Option<String>,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub date_added: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
