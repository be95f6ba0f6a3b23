pub mod payment_dto;
pub mod posting_dto;
