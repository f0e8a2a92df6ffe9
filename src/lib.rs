pub mod aggregate;
pub mod config;
pub mod error;
pub mod fetch;
pub mod geometry;
pub mod http_client;
pub mod locate;
pub mod match_extract;
pub mod mine;
pub mod normalize;
pub mod quality;
pub mod review;
pub mod run;
pub mod shots;
pub mod workbook_export;
