//! The reporting battery.
//!
//! Each query is a standalone function over already-loaded statement tables
//! and returns a [`Report`]. Queries are grouped by what they look at:
//!
//! - [`ownership`]: beneficial-ownership flags, interest types and levels (q111, q131, q132)
//! - [`parties`]: who the interested parties are and where owned entities are registered (q121, q122)
//! - [`shares`]: how shareholdings are disclosed (q141, q142)
//! - [`entities`]: completeness of entity statements (q211)
//!
//! [`run_query`] dispatches by [`QueryId`] and [`run_battery`] runs several,
//! skipping those whose tables were not loaded.
//!
//! ```no_run
//! use bodsight::codelist::StaticCodelists;
//! use bodsight::queries::{QueryId, QueryOptions, run_battery};
//! use bodsight::statements::StatementTables;
//!
//! let tables = StatementTables::load_dir("data/bods".as_ref())?;
//! let outcome = run_battery(
//!     &QueryId::ALL,
//!     &tables,
//!     &StaticCodelists::bundled(),
//!     &QueryOptions::default(),
//! )?;
//! for report in &outcome.reports {
//!     println!("{}: {} rows", report.query.id(), report.table.height());
//! }
//! # Ok::<(), bodsight::error::BodsError>(())
//! ```

pub mod entities;
pub mod ownership;
pub mod parties;
pub mod shares;

pub use entities::entity_name_presence;
pub use ownership::{
    beneficial_ownership_flags, interest_levels_by_beneficial_ownership,
    interest_types_by_beneficial_ownership,
};
pub use parties::{entity_owner_jurisdictions, interested_party_types};
pub use shares::{share_value_coverage, share_value_statistics};

use crate::codelist::CodelistSource;
use crate::error::{BodsError, Result};
use crate::report::Report;
use crate::statements::{StatementTables, TableKind};
use serde::{Deserialize, Serialize};

/// Value-axis label shared by the statement-count charts.
pub const OOC_AXIS_LABEL: &str = "Number of OOC statements";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum QueryId {
    #[value(name = "q111")]
    BeneficialOwnership,
    #[value(name = "q121")]
    InterestedPartyTypes,
    #[value(name = "q122")]
    EntityOwnerJurisdictions,
    #[value(name = "q131")]
    InterestTypes,
    #[value(name = "q132")]
    InterestLevels,
    #[value(name = "q141")]
    ShareCoverage,
    #[value(name = "q142")]
    ShareStatistics,
    #[value(name = "q211")]
    EntityNames,
}

impl QueryId {
    pub const ALL: [Self; 8] = [
        Self::BeneficialOwnership,
        Self::InterestedPartyTypes,
        Self::EntityOwnerJurisdictions,
        Self::InterestTypes,
        Self::InterestLevels,
        Self::ShareCoverage,
        Self::ShareStatistics,
        Self::EntityNames,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::BeneficialOwnership => "q111",
            Self::InterestedPartyTypes => "q121",
            Self::EntityOwnerJurisdictions => "q122",
            Self::InterestTypes => "q131",
            Self::InterestLevels => "q132",
            Self::ShareCoverage => "q141",
            Self::ShareStatistics => "q142",
            Self::EntityNames => "q211",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::BeneficialOwnership => "Beneficial ownership or control flags",
            Self::InterestedPartyTypes => "Types of interested parties",
            Self::EntityOwnerJurisdictions => {
                "Jurisdictions of entities with entity beneficial owners"
            }
            Self::InterestTypes => "Interest types by beneficial ownership",
            Self::InterestLevels => "Interest levels by beneficial ownership",
            Self::ShareCoverage => "Share values present",
            Self::ShareStatistics => "Share value statistics",
            Self::EntityNames => "Entity names present",
        }
    }

    /// Tables the query reads.
    pub fn tables(self) -> &'static [TableKind] {
        match self {
            Self::BeneficialOwnership | Self::InterestTypes | Self::InterestLevels => {
                &[TableKind::Interests, TableKind::OwnershipStatements]
            }
            Self::InterestedPartyTypes => &[
                TableKind::OwnershipStatements,
                TableKind::PersonStatements,
                TableKind::EntityStatements,
            ],
            Self::EntityOwnerJurisdictions => &[
                TableKind::Interests,
                TableKind::OwnershipStatements,
                TableKind::EntityStatements,
            ],
            Self::ShareCoverage | Self::ShareStatistics => &[TableKind::Interests],
            Self::EntityNames => &[TableKind::EntityStatements],
        }
    }
}

impl std::fmt::Display for QueryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Tunables of the battery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Reference line on the share histograms, in percent
    pub share_threshold: f64,
    /// Number of jurisdictions charted by q122
    pub top_jurisdictions: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            share_threshold: 25.0,
            top_jurisdictions: 10,
        }
    }
}

/// Runs a single query. `Ok(None)` means the query had nothing to report.
///
/// # Errors
///
/// Returns [`BodsError::MissingTable`] when a table it reads is not loaded,
/// and otherwise whatever the query itself fails with.
pub fn run_query(
    query: QueryId,
    tables: &StatementTables,
    codelists: &dyn CodelistSource,
    options: &QueryOptions,
) -> Result<Option<Report>> {
    use TableKind::{EntityStatements, Interests, OwnershipStatements, PersonStatements};

    tracing::debug!("Running {query}: {}", query.title());
    let report = match query {
        QueryId::BeneficialOwnership => beneficial_ownership_flags(
            tables.require(Interests)?,
            tables.require(OwnershipStatements)?,
        )?,
        QueryId::InterestedPartyTypes => interested_party_types(
            tables.require(OwnershipStatements)?,
            tables.require(PersonStatements)?,
            tables.require(EntityStatements)?,
            codelists,
        )?,
        QueryId::EntityOwnerJurisdictions => {
            return entity_owner_jurisdictions(
                tables.require(Interests)?,
                tables.require(OwnershipStatements)?,
                tables.require(EntityStatements)?,
                options.top_jurisdictions,
            );
        }
        QueryId::InterestTypes => interest_types_by_beneficial_ownership(
            tables.require(Interests)?,
            tables.require(OwnershipStatements)?,
            codelists,
        )?,
        QueryId::InterestLevels => interest_levels_by_beneficial_ownership(
            tables.require(Interests)?,
            tables.require(OwnershipStatements)?,
            codelists,
        )?,
        QueryId::ShareCoverage => share_value_coverage(tables.require(Interests)?)?,
        QueryId::ShareStatistics => {
            share_value_statistics(tables.require(Interests)?, options.share_threshold)?
        }
        QueryId::EntityNames => entity_name_presence(tables.require(EntityStatements)?)?,
    };
    Ok(Some(report))
}

/// Reports from a battery run, plus the queries that produced none.
#[derive(Debug, Default)]
pub struct BatteryOutcome {
    pub reports: Vec<Report>,
    pub skipped: Vec<(QueryId, String)>,
}

impl BatteryOutcome {
    pub fn report(&self, query: QueryId) -> Option<&Report> {
        self.reports.iter().find(|r| r.query == query)
    }
}

/// Runs `queries` in order.
///
/// A query whose tables were not loaded, or that has nothing to report, is
/// recorded in [`BatteryOutcome::skipped`].
///
/// # Errors
///
/// Any other query failure stops the run.
pub fn run_battery(
    queries: &[QueryId],
    tables: &StatementTables,
    codelists: &dyn CodelistSource,
    options: &QueryOptions,
) -> Result<BatteryOutcome> {
    let mut outcome = BatteryOutcome::default();
    for &query in queries {
        let missing: Vec<String> = query
            .tables()
            .iter()
            .filter(|kind| tables.get(**kind).is_none())
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            let reason = format!("needs table(s) {}", missing.join(", "));
            tracing::warn!("Skipping {query}: {reason}");
            outcome.skipped.push((query, reason));
            continue;
        }

        match run_query(query, tables, codelists, options) {
            Ok(Some(report)) => outcome.reports.push(report),
            Ok(None) => outcome
                .skipped
                .push((query, "nothing to report".to_owned())),
            Err(BodsError::MissingTable(table)) => {
                outcome.skipped.push((query, format!("needs table(s) {table}")));
            }
            Err(e) => {
                tracing::error!("{query} failed: {e}");
                return Err(e);
            }
        }
    }
    tracing::info!(
        "Battery finished: {} reports, {} skipped",
        outcome.reports.len(),
        outcome.skipped.len()
    );
    Ok(outcome)
}

#[cfg(test)]
pub(crate) mod test_support {
    use polars::prelude::*;

    /// Builds a frame of nullable text columns.
    pub fn text_frame(columns: &[(&str, Vec<Option<&str>>)]) -> DataFrame {
        DataFrame::new(
            columns
                .iter()
                .map(|(name, values)| Column::from(Series::new((*name).into(), values.clone())))
                .collect(),
        )
        .expect("valid frame")
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::text_frame;
    use super::*;
    use crate::codelist::StaticCodelists;
    use crate::statements::columns::{BENEFICIAL_OWNERSHIP, LINK, LINK_OOC_STATEMENT, NAME};

    #[test]
    fn test_battery_skips_queries_without_tables() -> Result<()> {
        let tables = StatementTables {
            ooes: Some(text_frame(&[(NAME, vec![Some("Acme"), None])])),
            ..StatementTables::default()
        };
        let outcome = run_battery(
            &QueryId::ALL,
            &tables,
            &StaticCodelists::bundled(),
            &QueryOptions::default(),
        )?;

        assert_eq!(outcome.reports.len(), 1);
        assert!(outcome.report(QueryId::EntityNames).is_some());
        assert_eq!(outcome.skipped.len(), QueryId::ALL.len() - 1);
        let (_, reason) = outcome
            .skipped
            .iter()
            .find(|(q, _)| *q == QueryId::ShareCoverage)
            .expect("q141 skipped");
        assert_eq!(reason, "needs table(s) ooci");
        Ok(())
    }

    #[test]
    fn test_battery_propagates_query_errors() {
        // ooc without `_link` cannot be joined
        let tables = StatementTables {
            ooc: Some(text_frame(&[("statementID", vec![Some("s1")])])),
            ooci: Some(text_frame(&[
                (LINK_OOC_STATEMENT, vec![Some("/1")]),
                (BENEFICIAL_OWNERSHIP, vec![Some("true")]),
            ])),
            ..StatementTables::default()
        };
        let result = run_battery(
            &[QueryId::BeneficialOwnership],
            &tables,
            &StaticCodelists::bundled(),
            &QueryOptions::default(),
        );
        match result {
            Err(BodsError::MissingColumn { table, column }) => {
                assert_eq!(table, "ooc");
                assert_eq!(column, LINK);
            }
            other => panic!("expected a missing column error, got {other:?}"),
        }
    }

    #[test]
    fn test_query_ids_are_unique() {
        let mut ids: Vec<&str> = QueryId::ALL.iter().map(|q| q.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), QueryId::ALL.len());
    }
}
