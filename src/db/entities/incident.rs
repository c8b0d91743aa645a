use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A tracked disruption. Its displayed status and message are always derived
/// from the most recent update, never stored here.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "page_incidents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub page_id: i64,
    pub create_time: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::page::Entity",
        from = "Column::PageId",
        to = "super::page::Column::Id",
        on_delete = "Cascade"
    )]
    Page,
    #[sea_orm(has_many = "super::incident_update::Entity")]
    Updates,
}

impl Related<super::page::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Page.def()
    }
}

impl Related<super::incident_update::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Updates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
