//! Completeness of entity statements.

use super::QueryId;
use crate::error::Result;
use crate::report::{Chart, CountRow, CountTable, MISSING, Report};
use crate::statements::columns::NAME;
use crate::statements::{TableKind, require_columns};
use polars::prelude::*;

const NAME_COLUMN: &str = "Name";
const PRESENT: &str = "Present";

/// q211: how many entity statements give a name.
///
/// # Errors
///
/// Returns [`crate::error::BodsError::MissingColumn`] if `ooes` has no `name` column.
pub fn entity_name_presence(ooes: &DataFrame) -> Result<Report> {
    require_columns(ooes, TableKind::EntityStatements, &[NAME])?;
    let names = ooes.column(NAME)?;
    let missing = names.null_count() as u64;
    let present = names.len() as u64 - missing;

    let mut table = CountTable::new("", vec![NAME_COLUMN.to_owned()]);
    table.rows = vec![
        CountRow {
            label: PRESENT.to_owned(),
            counts: vec![present],
        },
        CountRow {
            label: MISSING.to_owned(),
            counts: vec![missing],
        },
    ];

    let chart = Chart::bars(QueryId::EntityNames.title(), &table, false)
        .with_x_label("Number of entries")
        .with_legend(false);
    Ok(Report::new(
        QueryId::EntityNames,
        table.to_dataframe()?,
        vec![chart],
    ))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::text_frame;
    use super::*;

    #[test]
    fn test_entity_name_presence() -> Result<()> {
        let ooes = text_frame(&[(NAME, vec![Some("Acme Ltd"), None, Some("Widget plc")])]);
        let report = entity_name_presence(&ooes)?;
        assert_eq!(
            report.row_labels()?,
            vec![PRESENT.to_owned(), MISSING.to_owned()]
        );
        assert_eq!(report.count(PRESENT, NAME_COLUMN)?, Some(2));
        assert_eq!(report.count(MISSING, NAME_COLUMN)?, Some(1));
        Ok(())
    }

    #[test]
    fn test_entity_name_presence_empty_table() -> Result<()> {
        let ooes = text_frame(&[(NAME, Vec::new())]);
        let report = entity_name_presence(&ooes)?;
        assert_eq!(report.count(PRESENT, NAME_COLUMN)?, Some(0));
        assert_eq!(report.count(MISSING, NAME_COLUMN)?, Some(0));
        Ok(())
    }

    #[test]
    fn test_entity_name_presence_requires_name() {
        let ooes = text_frame(&[("statementID", vec![Some("e1")])]);
        assert!(entity_name_presence(&ooes).is_err());
    }
}
