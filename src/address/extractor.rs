//! Extração de endereço padronizado a partir do registro bruto.

use super::raw::RawAddress;
use super::snapshot::AddressSnapshot;

/// Converte um registro bruto em [`AddressSnapshot`].
///
/// Implementações são totais: campos ausentes viram `None`, nunca erro.
pub trait AddressExtractor: Send + Sync {
    /// Extrai o endereço padronizado.
    fn extract(&self, raw: &RawAddress) -> AddressSnapshot;
}

impl<F> AddressExtractor for F
where
    F: Fn(&RawAddress) -> AddressSnapshot + Send + Sync,
{
    fn extract(&self, raw: &RawAddress) -> AddressSnapshot {
        self(raw)
    }
}

/// Extrator para respostas no formato Nominatim/OpenStreetMap.
#[derive(Debug, Default, Clone, Copy)]
pub struct NominatimExtractor;

impl NominatimExtractor {
    /// Cria um novo extrator.
    pub fn new() -> Self {
        Self
    }
}

impl AddressExtractor for NominatimExtractor {
    fn extract(&self, raw: &RawAddress) -> AddressSnapshot {
        let Some(fields) = raw.address.as_ref() else {
            return AddressSnapshot::empty();
        };

        let sigla_uf = fields
            .iso3166_2_lvl4
            .as_deref()
            .and_then(|code| code.strip_prefix("BR-"))
            .map(str::to_string)
            .or_else(|| fields.state.as_deref().and_then(sigla_from_state).map(str::to_string));

        let regiao_metropolitana = fields
            .region
            .as_deref()
            .or(fields.state_district.as_deref())
            .filter(|r| r.to_lowercase().contains("metropolitana"));

        AddressSnapshot::builder()
            .logradouro(fields.street_name())
            .numero(fields.house_number.as_deref())
            .bairro(fields.neighborhood_name())
            .municipio(fields.municipality_name())
            .regiao_metropolitana(regiao_metropolitana)
            .uf(fields.state.as_deref())
            .sigla_uf(sigla_uf)
            .cep(fields.postcode.as_deref())
            .pais(fields.country.as_deref())
            .build()
    }
}

/// Sigla da unidade federativa a partir do nome do estado.
pub fn sigla_from_state(state: &str) -> Option<&'static str> {
    let sigla = match state.trim().to_lowercase().as_str() {
        "acre" => "AC",
        "alagoas" => "AL",
        "amapá" | "amapa" => "AP",
        "amazonas" => "AM",
        "bahia" => "BA",
        "ceará" | "ceara" => "CE",
        "distrito federal" => "DF",
        "espírito santo" | "espirito santo" => "ES",
        "goiás" | "goias" => "GO",
        "maranhão" | "maranhao" => "MA",
        "mato grosso" => "MT",
        "mato grosso do sul" => "MS",
        "minas gerais" => "MG",
        "pará" | "para" => "PA",
        "paraíba" | "paraiba" => "PB",
        "paraná" | "parana" => "PR",
        "pernambuco" => "PE",
        "piauí" | "piaui" => "PI",
        "rio de janeiro" => "RJ",
        "rio grande do norte" => "RN",
        "rio grande do sul" => "RS",
        "rondônia" | "rondonia" => "RO",
        "roraima" => "RR",
        "santa catarina" => "SC",
        "são paulo" | "sao paulo" => "SP",
        "sergipe" => "SE",
        "tocantins" => "TO",
        _ => return None,
    };
    Some(sigla)
}
