pub mod po;
pub mod bo;
pub mod dto;
