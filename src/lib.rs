//! # Guia
//!
//! Rastreamento de posição com detecção de mudanças de endereço.
//!
//! Amostras de geolocalização passam por um filtro de admissão (distância,
//! tempo e precisão); as aceitas são resolvidas para um endereço padronizado,
//! guardado num cache LRU com expiração. Mudanças de logradouro, bairro ou
//! município são notificadas uma única vez por transição.
//!
//! ## Módulos
//!
//! - [`position`] - Amostras, distância de haversine e filtro de admissão
//! - [`cache`] - Cache LRU com expiração e relógio injetável
//! - [`address`] - Endereço padronizado e detecção de mudanças por campo
//! - [`observer`] - Subject genérico com observers isolados
//! - [`coordinator`] - Liga o cache de endereços aos observers
//! - [`tracker`] - Pipeline completo amostra → endereço → observers
//! - [`cli`] - Interface de linha de comando
//! - [`types`] - Configuração e erros

pub mod address;
pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod coordinator;
pub mod observer;
pub mod position;
pub mod tracker;
pub mod types;

pub use types::config::Config;
pub use types::errors::{GuiaError, GuiaResult};
