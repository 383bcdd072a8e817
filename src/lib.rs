//! Rule based extraction of securities transactions from bank statements.

pub mod config;
pub mod pdf_import;
