pub mod catalog;
pub mod resource_type_store;
