//! Registros de mudança de endereço.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::snapshot::{AddressField, AddressSnapshot};

/// Marcador usado na assinatura para um valor ausente.
const ABSENT: &str = "∅";

/// Subconjunto de um endereço relevante para um campo monitorado.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logradouro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bairro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipio: Option<String>,
    #[serde(default, rename = "siglaUF", skip_serializing_if = "Option::is_none")]
    pub sigla_uf: Option<String>,
}

impl PartialAddress {
    /// Recorta de `snapshot` os campos relevantes para `field`.
    ///
    /// Município leva a sigla da UF como contexto.
    pub fn for_field(field: AddressField, snapshot: Option<&AddressSnapshot>) -> Self {
        let Some(snapshot) = snapshot else {
            return Self::default();
        };
        let owned = |v: Option<&str>| v.map(str::to_string);

        match field {
            AddressField::Logradouro => Self {
                logradouro: owned(snapshot.logradouro()),
                ..Self::default()
            },
            AddressField::Bairro => Self {
                bairro: owned(snapshot.bairro()),
                ..Self::default()
            },
            AddressField::Municipio => Self {
                municipio: owned(snapshot.municipio()),
                sigla_uf: owned(snapshot.sigla_uf()),
                ..Self::default()
            },
        }
    }

    /// Valor do campo monitorado.
    pub fn value(&self, field: AddressField) -> Option<&str> {
        match field {
            AddressField::Logradouro => self.logradouro.as_deref(),
            AddressField::Bairro => self.bairro.as_deref(),
            AddressField::Municipio => self.municipio.as_deref(),
        }
    }
}

/// Detalhes de uma comparação entre o endereço anterior e o atual.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDetails {
    /// Campo comparado.
    pub field: AddressField,

    /// Valores anteriores.
    pub previous: PartialAddress,

    /// Valores atuais.
    pub current: PartialAddress,

    /// Se o campo mudou.
    pub has_changed: bool,

    /// Momento da comparação (epoch ms no JSON).
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl ChangeDetails {
    /// Compara `field` entre dois endereços.
    pub fn compare(
        field: AddressField,
        previous: Option<&AddressSnapshot>,
        current: &AddressSnapshot,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let previous = PartialAddress::for_field(field, previous);
        let current = PartialAddress::for_field(field, Some(current));
        let has_changed = previous.value(field) != current.value(field);

        Self {
            field,
            previous,
            current,
            has_changed,
            timestamp,
        }
    }

    /// Valor anterior do campo.
    pub fn previous_value(&self) -> Option<&str> {
        self.previous.value(self.field)
    }

    /// Valor atual do campo.
    pub fn current_value(&self) -> Option<&str> {
        self.current.value(self.field)
    }

    /// Transição `(anterior, atual)` do campo, usada para deduplicação.
    pub fn transition(&self) -> (Option<String>, Option<String>) {
        (
            self.previous_value().map(str::to_string),
            self.current_value().map(str::to_string),
        )
    }

    /// Forma legível da transição (`anterior→atual`), para log.
    ///
    /// Não é injetiva: valores contendo `→` ou `∅` podem colidir. Use
    /// [`transition`](Self::transition) para comparar transições.
    pub fn signature(&self) -> String {
        format!(
            "{}→{}",
            self.previous_value().unwrap_or(ABSENT),
            self.current_value().unwrap_or(ABSENT)
        )
    }
}

/// Tipo de evento de mudança.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeType {
    LogradouroChanged,
    BairroChanged,
    MunicipioChanged,
}

impl From<AddressField> for ChangeType {
    fn from(field: AddressField) -> Self {
        match field {
            AddressField::Logradouro => ChangeType::LogradouroChanged,
            AddressField::Bairro => ChangeType::BairroChanged,
            AddressField::Municipio => ChangeType::MunicipioChanged,
        }
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeType::LogradouroChanged => write!(f, "LogradouroChanged"),
            ChangeType::BairroChanged => write!(f, "BairroChanged"),
            ChangeType::MunicipioChanged => write!(f, "MunicipioChanged"),
        }
    }
}

/// Valores anterior e atual de um campo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub previous: Option<String>,
    pub current: Option<String>,
}

/// Evento tipado entregue aos observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressChangeEvent {
    /// Tipo do evento.
    pub change_type: ChangeType,

    /// Valores do campo.
    pub change: FieldChange,

    /// Registro completo da comparação.
    pub details: ChangeDetails,
}

impl AddressChangeEvent {
    /// Cria o evento a partir dos detalhes de uma mudança.
    pub fn from_details(details: &ChangeDetails) -> Self {
        Self {
            change_type: ChangeType::from(details.field),
            change: FieldChange {
                previous: details.previous_value().map(str::to_string),
                current: details.current_value().map(str::to_string),
            },
            details: details.clone(),
        }
    }
}
