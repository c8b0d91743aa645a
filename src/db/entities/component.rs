use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Operational status of a monitored component, set by hand by an operator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ComponentStatus {
    #[sea_orm(string_value = "Operational")]
    #[serde(rename = "Operational")]
    Operational,
    #[sea_orm(string_value = "Performance Issues")]
    #[serde(rename = "Performance Issues")]
    PerformanceIssues,
    #[sea_orm(string_value = "Partial Outage")]
    #[serde(rename = "Partial Outage")]
    PartialOutage,
    #[sea_orm(string_value = "Major Outage")]
    #[serde(rename = "Major Outage")]
    MajorOutage,
}

/// Severity tier used to render a component's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTier {
    Success,
    Info,
    Warning,
    Danger,
}

impl StatusTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusTier::Success => "success",
            StatusTier::Info => "info",
            StatusTier::Warning => "warning",
            StatusTier::Danger => "danger",
        }
    }
}

impl ComponentStatus {
    /// Total mapping from status to severity tier.
    pub fn tier(&self) -> StatusTier {
        match self {
            ComponentStatus::Operational => StatusTier::Success,
            ComponentStatus::PerformanceIssues => StatusTier::Info,
            ComponentStatus::PartialOutage => StatusTier::Warning,
            ComponentStatus::MajorOutage => StatusTier::Danger,
        }
    }
}

impl Default for ComponentStatus {
    fn default() -> Self {
        ComponentStatus::Operational
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "page_components")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub status: ComponentStatus,
    pub page_id: i64,
    pub group_id: Option<i64>,
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
    #[sea_orm(
        belongs_to = "super::component_group::Entity",
        from = "Column::GroupId",
        to = "super::component_group::Column::Id",
        on_delete = "SetNull"
    )]
    Group,
}

impl Related<super::page::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Page.def()
    }
}

impl Related<super::component_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
