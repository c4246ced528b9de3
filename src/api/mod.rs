pub mod model_dto;
pub mod schedule_dto;
