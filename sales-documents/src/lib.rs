//! Sales documents - quotation and invoice totals engine with a REST
//! persistence client.

pub mod config;
pub mod dtos;
pub mod models;
pub mod services;
