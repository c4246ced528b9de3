pub mod id;
pub mod location;
pub mod resource;
pub mod resource_type;
pub mod task;
