//! Endereços padronizados, cache de endereços e detecção de mudanças.
//!
//! ## Detecção de mudanças
//!
//! A cada resolução, para cada campo monitorado (logradouro, bairro,
//! município), o endereço novo é comparado com o último resolvido. Uma
//! mudança gera notificação somente se a assinatura `anterior→atual` for
//! diferente da última notificada para aquele campo.
//!
//! ## Exemplo
//!
//! ```rust,ignore
//! use guia::address::{AddressCache, AddressField};
//!
//! let cache = AddressCache::from_config(&config.cache);
//! cache.set_field_change_callback(
//!     AddressField::Municipio,
//!     Some(Arc::new(|details| println!("{}", details.signature()))),
//! );
//! let endereco = cache.resolve(&raw);
//! ```

mod cache;
mod change;
mod extractor;
mod raw;
mod snapshot;

pub use cache::{AddressCache, FieldChangeCallback};
pub use change::{AddressChangeEvent, ChangeDetails, ChangeType, FieldChange, PartialAddress};
pub use extractor::{sigla_from_state, AddressExtractor, NominatimExtractor};
pub use raw::{RawAddress, RawAddressFields};
pub use snapshot::{AddressField, AddressSnapshot, AddressSnapshotBuilder, DEFAULT_COUNTRY};
