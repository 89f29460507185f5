pub mod feed;
pub mod generate;
pub mod listmodels;
