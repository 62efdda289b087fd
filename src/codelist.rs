//! Reference codelists of the Beneficial Ownership Data Standard.
//!
//! A codelist is a CSV file published alongside the schema whose `code`
//! column enumerates the permitted values of a field. Queries reconcile their
//! counts against these lists so that every permitted category shows up in a
//! report, even with a zero count.
//!
//! Codes come from a [`CodelistSource`]: [`RemoteCodelists`] downloads them
//! (with an optional on-disk cache), [`StaticCodelists`] serves fixed lists,
//! including the bundled 0.2.0 snapshot for offline runs.

pub mod case;
mod fetch;

pub use case::camel_to_snake;
pub use fetch::RemoteCodelists;

use crate::error::{BodsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_CODELIST_BASE_URL: &str =
    "https://raw.githubusercontent.com/openownership/data-standard";
pub const DEFAULT_STANDARD_VERSION: &str = "0.2.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum Codelist {
    #[value(alias = "personType")]
    PersonType,
    #[value(alias = "entityType")]
    EntityType,
    #[value(alias = "interestType")]
    InterestType,
    #[value(alias = "interestLevel")]
    InterestLevel,
}

impl Codelist {
    pub const ALL: [Self; 4] = [
        Self::PersonType,
        Self::EntityType,
        Self::InterestType,
        Self::InterestLevel,
    ];

    /// File name (without extension) under `schema/codelists/`.
    pub fn file_stem(self) -> &'static str {
        match self {
            Self::PersonType => "personType",
            Self::EntityType => "entityType",
            Self::InterestType => "interestType",
            Self::InterestLevel => "interestLevel",
        }
    }

    pub fn url(self, base_url: &str, version: &str) -> String {
        format!(
            "{}/{version}/schema/codelists/{}.csv",
            base_url.trim_end_matches('/'),
            self.file_stem()
        )
    }
}

impl std::fmt::Display for Codelist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// Case in which codes are returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CodelistCase {
    /// As published
    #[default]
    Camel,
    /// Lower case joined by `-`, see [`camel_to_snake`]
    Snake,
}

/// Anything able to produce the codes of a codelist, in published order.
pub trait CodelistSource {
    /// # Errors
    ///
    /// Returns [`BodsError::Codelist`] when the list cannot be obtained.
    fn codes(&self, list: Codelist) -> Result<Vec<String>>;
}

/// Reads a codelist from `source` and returns its codes in the requested case.
///
/// # Errors
///
/// Propagates the source's failure.
pub fn read_codelist(
    source: &dyn CodelistSource,
    list: Codelist,
    case: CodelistCase,
) -> Result<Vec<String>> {
    let codes = source.codes(list)?;
    Ok(match case {
        CodelistCase::Camel => codes,
        CodelistCase::Snake => codes.iter().map(|c| camel_to_snake(c)).collect(),
    })
}

/// Extracts the `code` column from codelist CSV bytes.
///
/// # Errors
///
/// Returns [`BodsError::Codelist`] if the CSV is malformed or has no `code` column.
pub fn parse_codelist_csv(bytes: &[u8]) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let code_idx = reader
        .headers()?
        .iter()
        .position(|h| h.trim().trim_start_matches('\u{feff}') == "code")
        .ok_or_else(|| BodsError::Codelist("codelist CSV has no 'code' column".to_owned()))?;

    let mut codes = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(code) = record.get(code_idx).map(str::trim)
            && !code.is_empty()
        {
            codes.push(code.to_owned());
        }
    }
    Ok(codes)
}

/// Codelists held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCodelists {
    lists: HashMap<Codelist, Vec<String>>,
}

impl StaticCodelists {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with<I, S>(mut self, list: Codelist, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lists
            .insert(list, codes.into_iter().map(Into::into).collect());
        self
    }

    /// Snapshot of the BODS 0.2.0 codelists used by the queries.
    pub fn bundled() -> Self {
        Self::new()
            .with(
                Codelist::PersonType,
                ["knownPerson", "anonymousPerson", "unknownPerson"],
            )
            .with(
                Codelist::EntityType,
                [
                    "registeredEntity",
                    "legalEntity",
                    "arrangement",
                    "anonymousEntity",
                    "unknownEntity",
                    "state",
                    "stateBody",
                ],
            )
            .with(
                Codelist::InterestType,
                [
                    "shareholding",
                    "voting-rights",
                    "appointment-of-board",
                    "other-influence-or-control",
                    "senior-managing-official",
                    "settlor-of-trust",
                    "trustee-of-trust",
                    "protector-of-trust",
                    "beneficiary-of-trust",
                    "other-influence-or-control-of-trust",
                    "rights-to-surplus-assets-on-dissolution",
                    "rights-to-profit-or-income",
                    "rights-granted-by-contract",
                    "conditional-rights-granted-by-contract",
                ],
            )
            .with(Codelist::InterestLevel, ["direct", "indirect", "unknown"])
    }
}

impl CodelistSource for StaticCodelists {
    fn codes(&self, list: Codelist) -> Result<Vec<String>> {
        self.lists
            .get(&list)
            .cloned()
            .ok_or_else(|| BodsError::Codelist(format!("no codes available for {list}")))
    }
}
