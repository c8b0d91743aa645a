use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle stage reported by an incident update.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum IncidentStatus {
    #[sea_orm(string_value = "Investigating")]
    Investigating,
    #[sea_orm(string_value = "Identified")]
    Identified,
    #[sea_orm(string_value = "Watching")]
    Watching,
    #[sea_orm(string_value = "Fixed")]
    Fixed,
}

impl IncidentStatus {
    /// Icon shown next to an incident in this lifecycle stage.
    pub fn icon(&self) -> &'static str {
        match self {
            IncidentStatus::Investigating => "fa-exclamation-triangle",
            IncidentStatus::Identified => "fa-dot-circle-o",
            IncidentStatus::Watching => "fa-eye",
            IncidentStatus::Fixed => "fa-check-circle",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "page_incident_updates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub status: IncidentStatus,
    pub message: String,
    pub incident_id: i64,
    /// Set once at creation.
    pub create_time: DateTimeUtc,
    /// Refreshed on every mutation.
    pub update_time: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::incident::Entity",
        from = "Column::IncidentId",
        to = "super::incident::Column::Id",
        on_delete = "Cascade"
    )]
    Incident,
}

impl Related<super::incident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Incident.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
