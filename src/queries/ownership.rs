//! Beneficial-ownership flags and the interests behind them.

use super::{OOC_AXIS_LABEL, QueryId};
use crate::codelist::{Codelist, CodelistCase, CodelistSource, read_codelist};
use crate::error::Result;
use crate::report::{ALL, Chart, CountTable, MISSING, Report};
use crate::statements::columns::{
    BENEFICIAL_OWNERSHIP, INTEREST_LEVEL, INTEREST_TYPE, LINK, LINK_OOC_STATEMENT,
};
use crate::statements::{
    TableKind, category_values, flag_label, flag_values, require_columns,
};
use polars::prelude::*;

/// Every OOC statement paired with each of its interests.
///
/// Statements without interests appear once, with null interest columns, so
/// that they are counted as missing rather than disappearing.
pub(crate) fn statements_with_interests(
    ooci: &DataFrame,
    ooc: &DataFrame,
    interest_columns: &[&str],
) -> Result<DataFrame> {
    require_columns(ooc, TableKind::OwnershipStatements, &[LINK])?;
    let mut needed = vec![LINK_OOC_STATEMENT];
    needed.extend_from_slice(interest_columns);
    require_columns(ooci, TableKind::Interests, &needed)?;

    let interests: Vec<Expr> = std::iter::once(col(LINK_OOC_STATEMENT).cast(DataType::String))
        .chain(interest_columns.iter().map(|c| col(*c)))
        .collect();

    let df = ooc
        .clone()
        .lazy()
        .select([col(LINK).cast(DataType::String)])
        .join(
            ooci.clone().lazy().select(interests),
            [col(LINK)],
            [col(LINK_OOC_STATEMENT)],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;
    Ok(df)
}

/// `True` / `False` labels of the beneficial-ownership flag, `None` when unset.
fn flag_labels(df: &DataFrame) -> Result<Vec<Option<&'static str>>> {
    Ok(flag_values(df, BENEFICIAL_OWNERSHIP)?
        .into_iter()
        .map(|f| f.map(flag_label))
        .collect())
}

/// q111: how many OOC statements declare beneficial ownership or control.
///
/// Statements whose interests leave the flag unset, or that have no interests
/// at all, are counted as `Missing`.
///
/// # Errors
///
/// Fails if a joined column is absent.
pub fn beneficial_ownership_flags(ooci: &DataFrame, ooc: &DataFrame) -> Result<Report> {
    let df = statements_with_interests(ooci, ooc, &[BENEFICIAL_OWNERSHIP])?;
    let table = CountTable::value_counts(BENEFICIAL_OWNERSHIP, flag_labels(&df)?, Some(MISSING));

    let chart = Chart::bars(QueryId::BeneficialOwnership.title(), &table, true)
        .with_x_label(OOC_AXIS_LABEL);
    Ok(Report::new(
        QueryId::BeneficialOwnership,
        table.to_dataframe()?,
        vec![chart],
    ))
}

/// q131: interest types against the beneficial-ownership flag.
///
/// # Errors
///
/// Fails if a joined column is absent or the interestType codelist cannot be read.
pub fn interest_types_by_beneficial_ownership(
    ooci: &DataFrame,
    ooc: &DataFrame,
    codelists: &dyn CodelistSource,
) -> Result<Report> {
    crosstab_by_beneficial_ownership(
        QueryId::InterestTypes,
        ooci,
        ooc,
        INTEREST_TYPE,
        Codelist::InterestType,
        codelists,
    )
}

/// q132: interest levels (direct, indirect, ...) against the beneficial-ownership flag.
///
/// # Errors
///
/// Fails if a joined column is absent or the interestLevel codelist cannot be read.
pub fn interest_levels_by_beneficial_ownership(
    ooci: &DataFrame,
    ooc: &DataFrame,
    codelists: &dyn CodelistSource,
) -> Result<Report> {
    crosstab_by_beneficial_ownership(
        QueryId::InterestLevels,
        ooci,
        ooc,
        INTEREST_LEVEL,
        Codelist::InterestLevel,
        codelists,
    )
}

/// Crosstab of `column` by flag with margins, reindexed onto the codelist
/// plus `Missing` and `All`, largest total first.
fn crosstab_by_beneficial_ownership(
    query: QueryId,
    ooci: &DataFrame,
    ooc: &DataFrame,
    column: &str,
    codelist: Codelist,
    codelists: &dyn CodelistSource,
) -> Result<Report> {
    let df = statements_with_interests(ooci, ooc, &[column, BENEFICIAL_OWNERSHIP])?;
    let pairs = category_values(&df, column)?
        .into_iter()
        .zip(flag_labels(&df)?)
        .map(|(category, flag)| {
            (
                category.unwrap_or_else(|| MISSING.to_owned()),
                flag.unwrap_or(MISSING).to_owned(),
            )
        });

    let mut labels = read_codelist(codelists, codelist, CodelistCase::Camel)?;
    labels.push(MISSING.to_owned());
    labels.push(ALL.to_owned());

    let mut table = CountTable::crosstab(column, pairs, true).reindex(&labels);
    table.sort_desc(ALL);

    let chart = Chart::bars(
        query.title(),
        &table.without_row(ALL).without_column(ALL),
        true,
    )
    .with_x_label(OOC_AXIS_LABEL);
    Ok(Report::new(query, table.to_dataframe()?, vec![chart]))
}
