pub mod component;
pub mod component_group;
pub mod incident;
pub mod incident_update;
pub mod page;
pub mod role;
pub mod user;

pub mod prelude {
    pub use super::component::{self, Entity as Component};
    pub use super::component_group::{self, Entity as ComponentGroup};
    pub use super::incident::{self, Entity as Incident};
    pub use super::incident_update::{self, Entity as IncidentUpdate};
    pub use super::page::{self, Entity as Page};
    pub use super::role::{self, Entity as Role};
    pub use super::user::{self, Entity as User};
}
