pub mod tenant_context;
pub mod tenant_registry;
