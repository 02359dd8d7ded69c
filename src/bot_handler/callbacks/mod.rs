pub mod export;
pub mod select;
