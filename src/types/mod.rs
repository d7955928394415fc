//! Tipos compartilhados do Guia.

pub mod config;
pub mod errors;
