pub mod api_dto;
pub mod device_telemetry_dto;
pub mod tick_report_dto;
