pub mod placement_dto;
pub mod test_dto;
