// handlers/elevated/root/mod.rs - Platform administration

pub mod organizations; // /api/root/organizations[/:id[/activate|/deactivate|/admin]]

pub use organizations::{
    organization_activate, organization_admin, organization_deactivate, organization_list, organization_show,
};
