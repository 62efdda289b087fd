//! Who the interested parties are, and where entity-owned entities are registered.

use super::{OOC_AXIS_LABEL, QueryId};
use crate::codelist::{Codelist, CodelistCase, CodelistSource, read_codelist};
use crate::error::Result;
use crate::report::{ALL, Chart, CountTable, MISSING, Report};
use crate::statements::columns::{
    BENEFICIAL_OWNERSHIP, ENTITY_TYPE, INTERESTED_PARTY_ENTITY, INTERESTED_PARTY_PERSON,
    JURISDICTION_NAME, LINK, LINK_OOC_STATEMENT, PERSON_TYPE, STATEMENT_ID, SUBJECT_ENTITY,
};
use crate::statements::{TableKind, category_values, flag_values, require_columns};
use polars::prelude::*;
use std::collections::HashSet;

const OWNER_TYPE: &str = "ownerType";

/// Copy of the entity statement id that survives the join.
const MATCHED_STATEMENT: &str = "matched_statementID";

/// q121: types of interested parties across all OOC statements.
///
/// Person parties are counted by `personType`, entity parties by `entityType`.
/// The table lists every code of both codelists (zero when unseen) plus an
/// `All` total, largest first.
///
/// # Errors
///
/// Fails if a joined column is absent or a codelist cannot be read.
pub fn interested_party_types(
    ooc: &DataFrame,
    oops: &DataFrame,
    ooes: &DataFrame,
    codelists: &dyn CodelistSource,
) -> Result<Report> {
    let persons = owner_type_counts(
        ooc,
        INTERESTED_PARTY_PERSON,
        oops,
        TableKind::PersonStatements,
        PERSON_TYPE,
    )?;
    let entities = owner_type_counts(
        ooc,
        INTERESTED_PARTY_ENTITY,
        ooes,
        TableKind::EntityStatements,
        ENTITY_TYPE,
    )?;

    let mut labels = read_codelist(codelists, Codelist::PersonType, CodelistCase::Camel)?;
    labels.extend(read_codelist(codelists, Codelist::EntityType, CodelistCase::Camel)?);

    let mut table = persons;
    table.rows.extend(entities.rows);
    let mut table = table.reindex(&labels);
    table.push_total(ALL);
    table.sort_desc(OWNER_TYPE);

    let chart = Chart::bars(QueryId::InterestedPartyTypes.title(), &table, false)
        .with_x_label(OOC_AXIS_LABEL)
        .with_legend(false);
    Ok(Report::new(
        QueryId::InterestedPartyTypes,
        table.to_dataframe()?,
        vec![chart],
    ))
}

/// Counts `type_column` of the statements referenced by `party_column`.
/// Statements that cannot be matched, or whose type is unset, are not counted.
fn owner_type_counts(
    ooc: &DataFrame,
    party_column: &str,
    statements: &DataFrame,
    kind: TableKind,
    type_column: &str,
) -> Result<CountTable> {
    require_columns(ooc, TableKind::OwnershipStatements, &[party_column])?;
    require_columns(statements, kind, &[STATEMENT_ID, type_column])?;

    let df = ooc
        .clone()
        .lazy()
        .select([col(party_column).cast(DataType::String)])
        .filter(col(party_column).is_not_null())
        .join(
            statements.clone().lazy().select([
                col(STATEMENT_ID).cast(DataType::String),
                col(type_column).cast(DataType::String),
            ]),
            [col(party_column)],
            [col(STATEMENT_ID)],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;

    tracing::debug!("{} {kind} interested parties", df.height());
    Ok(CountTable::value_counts(
        OWNER_TYPE,
        category_values(&df, type_column)?,
        None,
    ))
}

/// q122: jurisdictions of entities that have another entity as a beneficial owner.
///
/// Only interests flagged as beneficial ownership or control count, and each
/// subject entity is counted once. Returns `Ok(None)` when no such interest
/// has an entity as its interested party.
///
/// # Errors
///
/// Fails if a joined column is absent.
pub fn entity_owner_jurisdictions(
    ooci: &DataFrame,
    ooc: &DataFrame,
    ooes: &DataFrame,
    top_n: usize,
) -> Result<Option<Report>> {
    require_columns(
        ooci,
        TableKind::Interests,
        &[LINK_OOC_STATEMENT, BENEFICIAL_OWNERSHIP],
    )?;
    require_columns(
        ooc,
        TableKind::OwnershipStatements,
        &[LINK, SUBJECT_ENTITY, INTERESTED_PARTY_ENTITY],
    )?;
    require_columns(
        ooes,
        TableKind::EntityStatements,
        &[STATEMENT_ID, JURISDICTION_NAME],
    )?;

    let mask: BooleanChunked = flag_values(ooci, BENEFICIAL_OWNERSHIP)?
        .into_iter()
        .map(|flag| flag == Some(true))
        .collect();
    let flagged = ooci.select([LINK_OOC_STATEMENT])?.filter(&mask)?;

    let owned_by_entities = flagged
        .lazy()
        .select([col(LINK_OOC_STATEMENT).cast(DataType::String)])
        .join(
            ooc.clone().lazy().select([
                col(LINK).cast(DataType::String),
                col(SUBJECT_ENTITY).cast(DataType::String),
                col(INTERESTED_PARTY_ENTITY).cast(DataType::String),
            ]),
            [col(LINK_OOC_STATEMENT)],
            [col(LINK)],
            JoinArgs::new(JoinType::Left),
        )
        .filter(col(INTERESTED_PARTY_ENTITY).is_not_null())
        .collect()?;

    if owned_by_entities.height() == 0 {
        tracing::info!("No entities with other entities as beneficial owners");
        return Ok(None);
    }

    let df = owned_by_entities
        .lazy()
        .join(
            ooes.clone().lazy().select([
                col(STATEMENT_ID).cast(DataType::String),
                col(STATEMENT_ID)
                    .cast(DataType::String)
                    .alias(MATCHED_STATEMENT),
                col(JURISDICTION_NAME).cast(DataType::String),
            ]),
            [col(SUBJECT_ENTITY)],
            [col(STATEMENT_ID)],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;

    // First row per matched entity statement; unmatched rows share one key.
    let mut seen = HashSet::new();
    let jurisdictions: Vec<Option<String>> = category_values(&df, MATCHED_STATEMENT)?
        .into_iter()
        .zip(category_values(&df, JURISDICTION_NAME)?)
        .filter_map(|(statement, jurisdiction)| seen.insert(statement).then_some(jurisdiction))
        .collect();

    let mut table = CountTable::value_counts(JURISDICTION_NAME, jurisdictions, Some(MISSING));
    table.push_total(ALL);

    let chart = Chart::bars(
        QueryId::EntityOwnerJurisdictions.title(),
        &table.without_row(ALL).head(top_n),
        false,
    )
    .with_x_label(OOC_AXIS_LABEL);
    Ok(Some(Report::new(
        QueryId::EntityOwnerJurisdictions,
        table.to_dataframe()?,
        vec![chart],
    )))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::text_frame;
    use super::*;
    use crate::codelist::StaticCodelists;
    use crate::report::ChartData;

    fn ooc() -> DataFrame {
        text_frame(&[
            (LINK, vec![Some("/1"), Some("/2"), Some("/3"), Some("/4")]),
            (
                SUBJECT_ENTITY,
                vec![Some("e1"), Some("e1"), Some("e2"), Some("e3")],
            ),
            (
                INTERESTED_PARTY_PERSON,
                vec![Some("p1"), None, Some("p2"), None],
            ),
            (
                INTERESTED_PARTY_ENTITY,
                vec![None, Some("e4"), None, Some("e5")],
            ),
        ])
    }

    fn oops() -> DataFrame {
        text_frame(&[
            (STATEMENT_ID, vec![Some("p1"), Some("p2")]),
            (PERSON_TYPE, vec![Some("knownPerson"), Some("knownPerson")]),
        ])
    }

    fn ooes() -> DataFrame {
        text_frame(&[
            (
                STATEMENT_ID,
                vec![Some("e1"), Some("e2"), Some("e4"), Some("e5")],
            ),
            (
                ENTITY_TYPE,
                vec![
                    Some("registeredEntity"),
                    Some("registeredEntity"),
                    Some("state"),
                    Some("notACode"),
                ],
            ),
            (
                JURISDICTION_NAME,
                vec![Some("United Kingdom"), Some("Denmark"), None, None],
            ),
        ])
    }

    #[test]
    fn test_interested_party_types() -> Result<()> {
        let codelists = StaticCodelists::bundled();
        let report = interested_party_types(&ooc(), &oops(), &ooes(), &codelists)?;

        assert_eq!(report.count("knownPerson", OWNER_TYPE)?, Some(2));
        assert_eq!(report.count("state", OWNER_TYPE)?, Some(1));
        assert_eq!(report.count("anonymousPerson", OWNER_TYPE)?, Some(0));
        // codes outside the codelists are dropped before totalling
        assert_eq!(report.count("notACode", OWNER_TYPE)?, None);
        assert_eq!(report.count(ALL, OWNER_TYPE)?, Some(3));

        let labels = report.row_labels()?;
        assert_eq!(labels.first().map(String::as_str), Some(ALL));
        assert_eq!(labels.get(1).map(String::as_str), Some("knownPerson"));

        let chart = report.charts.first().expect("one chart");
        assert!(!chart.legend);
        Ok(())
    }

    #[test]
    fn test_interested_party_types_requires_person_type() {
        let oops = text_frame(&[(STATEMENT_ID, vec![Some("p1")])]);
        let result =
            interested_party_types(&ooc(), &oops, &ooes(), &StaticCodelists::bundled());
        assert!(matches!(
            result,
            Err(crate::error::BodsError::MissingColumn { ref column, .. }) if column == PERSON_TYPE
        ));
    }

    fn ooci(flags: Vec<Option<&str>>) -> DataFrame {
        text_frame(&[
            (
                LINK_OOC_STATEMENT,
                vec![Some("/1"), Some("/2"), Some("/2"), Some("/3"), Some("/4")],
            ),
            (BENEFICIAL_OWNERSHIP, flags),
        ])
    }

    #[test]
    fn test_entity_owner_jurisdictions_counts_each_subject_once() -> Result<()> {
        // e3 has no entity statement
        let ooci = ooci(vec![
            Some("True"),
            Some("True"),
            Some("True"),
            Some("True"),
            Some("True"),
        ]);
        let report = entity_owner_jurisdictions(&ooci, &ooc(), &ooes(), 10)?
            .expect("entity owners present");

        // "/2" (subject e1) appears twice but counts once; "/4" (subject e3) is unmatched
        assert_eq!(report.count("United Kingdom", JURISDICTION_NAME)?, Some(1));
        assert_eq!(report.count(MISSING, JURISDICTION_NAME)?, Some(1));
        assert_eq!(report.count(ALL, JURISDICTION_NAME)?, Some(2));
        assert_eq!(report.row_labels()?.last().map(String::as_str), Some(ALL));
        Ok(())
    }

    #[test]
    fn test_entity_owner_jurisdictions_chart_is_limited() -> Result<()> {
        let ooci = ooci(vec![
            Some("True"),
            Some("True"),
            Some("false"),
            Some("True"),
            Some("True"),
        ]);
        let report = entity_owner_jurisdictions(&ooci, &ooc(), &ooes(), 1)?
            .expect("entity owners present");

        let chart = report.charts.first().expect("one chart");
        match &chart.data {
            ChartData::Bars { categories, .. } => assert_eq!(categories.len(), 1),
            ChartData::Histogram { .. } => panic!("expected bars"),
        }
        assert_eq!(report.row_labels()?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_entity_owner_jurisdictions_none_without_entity_owners() -> Result<()> {
        let ooci = ooci(vec![Some("True"), Some("false"), None, Some("True"), None]);
        assert!(entity_owner_jurisdictions(&ooci, &ooc(), &ooes(), 10)?.is_none());
        Ok(())
    }
}
