// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Document records and the tabular registry they are read from.
//!
//! The registry is a CSV export with Portuguese column names (`tipo`,
//! `numero`, `data`, `assunto`, `url_bcb`). English names are accepted as
//! aliases. Rows are validated one by one: a bad row yields
//! [`AcquireError::RecordInvalid`] and never blocks the rows after it.

use crate::error::{AcquireError, AcquireResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One document to acquire. Identity is `(doc_type, number)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub number: String,
    pub date: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl DocumentRecord {
    /// Identity key.
    pub fn id(&self) -> (&str, &str) {
        (&self.doc_type, &self.number)
    }

    /// Human label used in logs, e.g. `Resolução CMN 4.734`.
    pub fn label(&self) -> String {
        format!("{} {}", self.doc_type, self.number)
    }

    /// The number as the portal expects it: a spreadsheet-induced trailing
    /// `.0` is dropped (`501.0` -> `501`), thousands separators are kept.
    pub fn clean_number(&self) -> &str {
        strip_float_suffix(&self.number)
    }
}

pub(crate) fn strip_float_suffix(number: &str) -> &str {
    number.strip_suffix(".0").unwrap_or(number)
}

/// Raw CSV row before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RegistryRow {
    #[serde(alias = "type")]
    tipo: Option<String>,
    #[serde(alias = "number")]
    numero: Option<String>,
    #[serde(alias = "date")]
    data: Option<String>,
    #[serde(alias = "subject")]
    assunto: Option<String>,
    #[serde(alias = "source_url", alias = "url")]
    url_bcb: Option<String>,
}

impl RegistryRow {
    fn validate(self, row: usize) -> AcquireResult<DocumentRecord> {
        Ok(DocumentRecord {
            doc_type: required(self.tipo, row, "type")?,
            number: required(self.numero, row, "number")?,
            date: required(self.data, row, "date")?,
            subject: required(self.assunto, row, "subject")?,
            source_url: non_empty(self.url_bcb),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, row: usize, field: &'static str) -> AcquireResult<String> {
    non_empty(value).ok_or(AcquireError::RecordInvalid { row, field })
}

/// Parse a registry from any reader. One entry per data row, in order.
/// Row numbers in errors are 1-based and exclude the header line.
pub fn read_registry<R: std::io::Read>(reader: R) -> Vec<AcquireResult<DocumentRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader
        .deserialize::<RegistryRow>()
        .enumerate()
        .map(|(i, row)| row.map_err(AcquireError::from)?.validate(i + 1))
        .collect()
}

/// Load the registry file at `path`.
pub fn load_registry(path: &Path) -> AcquireResult<Vec<AcquireResult<DocumentRecord>>> {
    let file = std::fs::File::open(path)?;
    let rows = read_registry(std::io::BufReader::new(file));
    tracing::info!("loaded {} registry rows from {}", rows.len(), path.display());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const REGISTRY: &str = "\
tipo,numero,data,assunto,url_bcb
Resolução CMN,4.734,27/6/2019,limites operacionais e requisitos,https://www.bcb.gov.br/estabilidadefinanceira/exibenormativo?tipo=Resolu%C3%A7%C3%A3o%20CMN&numero=4.734
Circular,,4/11/2013,sem numero,
Circular,3682.0,4/11/2013,arranjos de pagamento,
";

    #[test]
    fn test_reads_valid_rows() {
        let rows = read_registry(REGISTRY.as_bytes());
        assert_eq!(rows.len(), 3);
        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.id(), ("Resolução CMN", "4.734"));
        assert!(first.source_url.as_deref().unwrap().contains("exibenormativo"));
        assert_eq!(first.label(), "Resolução CMN 4.734");
    }

    #[test]
    fn test_missing_number_is_invalid() {
        let rows = read_registry(REGISTRY.as_bytes());
        match &rows[1] {
            Err(AcquireError::RecordInvalid { row, field }) => {
                assert_eq!(*row, 2);
                assert_eq!(*field, "number");
            }
            other => panic!("expected RecordInvalid, got {other:?}"),
        }
        assert_eq!(rows[1].as_ref().unwrap_err().kind(), ErrorKind::RecordInvalid);
    }

    #[test]
    fn test_optional_url_and_float_number() {
        let rows = read_registry(REGISTRY.as_bytes());
        let third = rows[2].as_ref().unwrap();
        assert_eq!(third.source_url, None);
        assert_eq!(third.clean_number(), "3682");
    }

    #[test]
    fn test_english_headers() {
        let csv = "type,number,date,subject\nCircular,1,1/1/2020,teste\n";
        let rows = read_registry(csv.as_bytes());
        assert_eq!(rows[0].as_ref().unwrap().doc_type, "Circular");
    }

    #[test]
    fn test_short_row_is_invalid_not_fatal() {
        let csv = "tipo,numero,data,assunto\nCircular,10\nCircular,11,1/1/2020,ok\n";
        let rows = read_registry(csv.as_bytes());
        assert!(rows[0].is_err());
        assert!(rows[1].is_ok());
    }
}
