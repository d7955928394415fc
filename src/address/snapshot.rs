//! Endereço padronizado.

use serde::{Deserialize, Serialize};

/// País assumido quando a fonte não informa.
pub const DEFAULT_COUNTRY: &str = "Brasil";

/// Campos de endereço monitorados pela detecção de mudanças.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressField {
    /// Rua, avenida, travessa.
    Logradouro,
    /// Bairro.
    Bairro,
    /// Município.
    Municipio,
}

impl AddressField {
    /// Todos os campos monitorados, na ordem de avaliação.
    pub const ALL: [AddressField; 3] = [
        AddressField::Logradouro,
        AddressField::Bairro,
        AddressField::Municipio,
    ];
}

impl std::fmt::Display for AddressField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressField::Logradouro => write!(f, "logradouro"),
            AddressField::Bairro => write!(f, "bairro"),
            AddressField::Municipio => write!(f, "municipio"),
        }
    }
}

/// Endereço padronizado brasileiro. Imutável; construído via [`AddressSnapshotBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSnapshot {
    logradouro: Option<String>,
    numero: Option<String>,
    bairro: Option<String>,
    municipio: Option<String>,
    regiao_metropolitana: Option<String>,
    uf: Option<String>,
    #[serde(rename = "siglaUF")]
    sigla_uf: Option<String>,
    cep: Option<String>,
    pais: String,
}

impl AddressSnapshot {
    /// Inicia a construção de um endereço.
    pub fn builder() -> AddressSnapshotBuilder {
        AddressSnapshotBuilder::default()
    }

    /// Endereço sem nenhum campo conhecido.
    pub fn empty() -> Self {
        Self::builder().build()
    }

    pub fn logradouro(&self) -> Option<&str> {
        self.logradouro.as_deref()
    }

    pub fn numero(&self) -> Option<&str> {
        self.numero.as_deref()
    }

    pub fn bairro(&self) -> Option<&str> {
        self.bairro.as_deref()
    }

    pub fn municipio(&self) -> Option<&str> {
        self.municipio.as_deref()
    }

    pub fn regiao_metropolitana(&self) -> Option<&str> {
        self.regiao_metropolitana.as_deref()
    }

    pub fn uf(&self) -> Option<&str> {
        self.uf.as_deref()
    }

    pub fn sigla_uf(&self) -> Option<&str> {
        self.sigla_uf.as_deref()
    }

    pub fn cep(&self) -> Option<&str> {
        self.cep.as_deref()
    }

    pub fn pais(&self) -> &str {
        &self.pais
    }

    /// Valor de um campo monitorado.
    pub fn field(&self, field: AddressField) -> Option<&str> {
        match field {
            AddressField::Logradouro => self.logradouro(),
            AddressField::Bairro => self.bairro(),
            AddressField::Municipio => self.municipio(),
        }
    }

    /// Verifica se nenhum campo de localização foi extraído.
    pub fn is_empty(&self) -> bool {
        self.logradouro.is_none()
            && self.bairro.is_none()
            && self.municipio.is_none()
            && self.uf.is_none()
            && self.cep.is_none()
    }
}

impl std::fmt::Display for AddressSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let street = match (self.logradouro(), self.numero()) {
            (Some(l), Some(n)) => Some(format!("{}, {}", l, n)),
            (Some(l), None) => Some(l.to_string()),
            _ => None,
        };
        let city = match (self.municipio(), self.sigla_uf()) {
            (Some(m), Some(uf)) => Some(format!("{} - {}", m, uf)),
            (Some(m), None) => Some(m.to_string()),
            _ => None,
        };
        let parts: Vec<String> = [street, self.bairro.clone(), city, self.cep.clone()]
            .into_iter()
            .flatten()
            .collect();

        if parts.is_empty() {
            write!(f, "{}", self.pais)
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// Construtor de [`AddressSnapshot`]. Valores vazios ou só com espaços viram ausência.
#[derive(Debug, Clone, Default)]
pub struct AddressSnapshotBuilder {
    logradouro: Option<String>,
    numero: Option<String>,
    bairro: Option<String>,
    municipio: Option<String>,
    regiao_metropolitana: Option<String>,
    uf: Option<String>,
    sigla_uf: Option<String>,
    cep: Option<String>,
    pais: Option<String>,
}

impl AddressSnapshotBuilder {
    pub fn logradouro(mut self, value: Option<impl Into<String>>) -> Self {
        self.logradouro = clean(value);
        self
    }

    pub fn numero(mut self, value: Option<impl Into<String>>) -> Self {
        self.numero = clean(value);
        self
    }

    pub fn bairro(mut self, value: Option<impl Into<String>>) -> Self {
        self.bairro = clean(value);
        self
    }

    pub fn municipio(mut self, value: Option<impl Into<String>>) -> Self {
        self.municipio = clean(value);
        self
    }

    pub fn regiao_metropolitana(mut self, value: Option<impl Into<String>>) -> Self {
        self.regiao_metropolitana = clean(value);
        self
    }

    pub fn uf(mut self, value: Option<impl Into<String>>) -> Self {
        self.uf = clean(value);
        self
    }

    pub fn sigla_uf(mut self, value: Option<impl Into<String>>) -> Self {
        self.sigla_uf = clean(value);
        self
    }

    pub fn cep(mut self, value: Option<impl Into<String>>) -> Self {
        self.cep = clean(value);
        self
    }

    pub fn pais(mut self, value: Option<impl Into<String>>) -> Self {
        self.pais = clean(value);
        self
    }

    /// Finaliza o endereço.
    pub fn build(self) -> AddressSnapshot {
        AddressSnapshot {
            logradouro: self.logradouro,
            numero: self.numero,
            bairro: self.bairro,
            municipio: self.municipio,
            regiao_metropolitana: self.regiao_metropolitana,
            uf: self.uf,
            sigla_uf: self.sigla_uf,
            cep: self.cep,
            pais: self.pais.unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        }
    }
}

fn clean(value: Option<impl Into<String>>) -> Option<String> {
    value
        .map(Into::into)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let snapshot = AddressSnapshot::empty();
        assert_eq!(snapshot.pais(), DEFAULT_COUNTRY);
        assert!(snapshot.is_empty());
        assert!(snapshot.field(AddressField::Municipio).is_none());
    }

    #[test]
    fn test_builder_trims_and_drops_blank() {
        let snapshot = AddressSnapshot::builder()
            .logradouro(Some("  Rua da Aurora "))
            .bairro(Some("   "))
            .municipio(Some("Recife"))
            .build();

        assert_eq!(snapshot.logradouro(), Some("Rua da Aurora"));
        assert!(snapshot.bairro().is_none());
        assert_eq!(snapshot.field(AddressField::Municipio), Some("Recife"));
    }

    #[test]
    fn test_display() {
        let snapshot = AddressSnapshot::builder()
            .logradouro(Some("Rua da Aurora"))
            .numero(Some("100"))
            .bairro(Some("Boa Vista"))
            .municipio(Some("Recife"))
            .sigla_uf(Some("PE"))
            .build();

        assert_eq!(
            snapshot.to_string(),
            "Rua da Aurora, 100, Boa Vista, Recife - PE"
        );
        assert_eq!(AddressSnapshot::empty().to_string(), "Brasil");
    }

    #[test]
    fn test_serialize_camel_case() {
        let snapshot = AddressSnapshot::builder()
            .sigla_uf(Some("MG"))
            .regiao_metropolitana(Some("Região Metropolitana de Belo Horizonte"))
            .build();

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["siglaUF"], "MG");
        assert_eq!(json["regiaoMetropolitana"], "Região Metropolitana de Belo Horizonte");
        assert_eq!(json["pais"], "Brasil");
    }

    #[test]
    fn test_field_display() {
        assert_eq!(AddressField::Logradouro.to_string(), "logradouro");
        assert_eq!(AddressField::ALL.len(), 3);
    }
}
