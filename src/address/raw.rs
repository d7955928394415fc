//! Registro bruto de geocodificação reversa (formato Nominatim).

use serde::{Deserialize, Serialize};

/// Campos do objeto `address` de uma resposta Nominatim.
///
/// Todos são opcionais: a fonte omite o que não conhece.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAddressFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pedestrian: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighbourhood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suburb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub town: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub village: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(
        default,
        rename = "ISO3166-2-lvl4",
        skip_serializing_if = "Option::is_none"
    )]
    pub iso3166_2_lvl4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

impl RawAddressFields {
    /// Nome da via.
    pub fn street_name(&self) -> Option<&str> {
        first_present(&[&self.road, &self.pedestrian, &self.street])
    }

    /// Nome do bairro.
    pub fn neighborhood_name(&self) -> Option<&str> {
        first_present(&[&self.neighbourhood, &self.suburb, &self.quarter])
    }

    /// Nome do município.
    pub fn municipality_name(&self) -> Option<&str> {
        first_present(&[&self.city, &self.town, &self.village, &self.municipality])
    }
}

/// Registro bruto recebido do serviço de geocodificação reversa.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<RawAddressFields>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl RawAddress {
    /// Cria um registro a partir dos campos de endereço.
    pub fn from_fields(fields: RawAddressFields) -> Self {
        Self {
            address: Some(fields),
            display_name: None,
        }
    }
}

fn first_present<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
}
