//! The statement tables the queries read.
//!
//! Tables come from a flattened BODS 0.2 export: one table per statement type
//! plus one for the interests nested in ownership-or-control statements.
//! Nested objects are flattened into `parent_child` column names
//! (`interestedParty_describedByPersonStatement`), and interests point back to
//! their statement through `_link_ooc_statement`.

pub mod io;

use crate::error::{BodsError, Result};
use polars::prelude::*;
use std::path::Path;

/// Column names read by the queries.
pub mod columns {
    pub const LINK: &str = "_link";
    pub const LINK_OOC_STATEMENT: &str = "_link_ooc_statement";
    pub const STATEMENT_ID: &str = "statementID";

    pub const INTERESTED_PARTY_PERSON: &str = "interestedParty_describedByPersonStatement";
    pub const INTERESTED_PARTY_ENTITY: &str = "interestedParty_describedByEntityStatement";
    pub const SUBJECT_ENTITY: &str = "subject_describedByEntityStatement";

    pub const INTEREST_TYPE: &str = "type";
    pub const INTEREST_LEVEL: &str = "interestLevel";
    pub const BENEFICIAL_OWNERSHIP: &str = "beneficialOwnershipOrControl";
    pub const SHARE_EXACT: &str = "share_exact";
    pub const SHARE_MINIMUM: &str = "share_minimum";
    pub const SHARE_MAXIMUM: &str = "share_maximum";

    pub const PERSON_TYPE: &str = "personType";
    pub const ENTITY_TYPE: &str = "entityType";
    pub const JURISDICTION_NAME: &str = "incorporatedInJurisdiction_name";
    pub const NAME: &str = "name";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// Ownership-or-control statements (OOC)
    OwnershipStatements,
    /// Interests of ownership-or-control statements (OOCI)
    Interests,
    PersonStatements,
    EntityStatements,
}

impl TableKind {
    pub const ALL: [Self; 4] = [
        Self::OwnershipStatements,
        Self::Interests,
        Self::PersonStatements,
        Self::EntityStatements,
    ];

    pub fn short_name(self) -> &'static str {
        match self {
            Self::OwnershipStatements => "ooc",
            Self::Interests => "ooci",
            Self::PersonStatements => "oops",
            Self::EntityStatements => "ooes",
        }
    }

    /// File stems recognised for this table: the flatten-tool name, then the short name.
    pub fn file_stems(self) -> [&'static str; 2] {
        let long = match self {
            Self::OwnershipStatements => "ownershipOrControlStatement",
            Self::Interests => "ownershipOrControlStatement_interests",
            Self::PersonStatements => "personStatement",
            Self::EntityStatements => "entityStatement",
        };
        [long, self.short_name()]
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

/// The four statement tables; any of them may be absent.
#[derive(Default, Clone)]
pub struct StatementTables {
    pub ooc: Option<DataFrame>,
    pub ooci: Option<DataFrame>,
    pub oops: Option<DataFrame>,
    pub ooes: Option<DataFrame>,
}

impl StatementTables {
    /// Loads every table found in `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`BodsError::InvalidPath`] if `dir` is not a directory, or the
    /// loader's error for a table file that cannot be read.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(BodsError::InvalidPath(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let mut tables = Self::default();
        for kind in TableKind::ALL {
            let Some(path) = find_table_file(dir, kind) else {
                tracing::debug!("No {kind} table in {}", dir.display());
                continue;
            };
            let df = io::load_df(&path)?;
            tracing::info!("Loaded {kind} from {} ({} rows)", path.display(), df.height());
            tables.set(kind, df);
        }

        if TableKind::ALL.iter().all(|k| tables.get(*k).is_none()) {
            tracing::warn!("No statement tables found in {}", dir.display());
        }
        Ok(tables)
    }

    pub fn get(&self, kind: TableKind) -> Option<&DataFrame> {
        match kind {
            TableKind::OwnershipStatements => self.ooc.as_ref(),
            TableKind::Interests => self.ooci.as_ref(),
            TableKind::PersonStatements => self.oops.as_ref(),
            TableKind::EntityStatements => self.ooes.as_ref(),
        }
    }

    pub fn set(&mut self, kind: TableKind, df: DataFrame) {
        let slot = match kind {
            TableKind::OwnershipStatements => &mut self.ooc,
            TableKind::Interests => &mut self.ooci,
            TableKind::PersonStatements => &mut self.oops,
            TableKind::EntityStatements => &mut self.ooes,
        };
        *slot = Some(df);
    }

    /// # Errors
    ///
    /// Returns [`BodsError::MissingTable`] when the table was not loaded.
    pub fn require(&self, kind: TableKind) -> Result<&DataFrame> {
        self.get(kind)
            .ok_or_else(|| BodsError::MissingTable(kind.to_string()))
    }
}

fn find_table_file(dir: &Path, kind: TableKind) -> Option<std::path::PathBuf> {
    kind.file_stems().into_iter().find_map(|stem| {
        io::SUPPORTED_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{stem}.{ext}")))
            .find(|p| p.is_file())
    })
}

/// Fails on the first of `required` that `df` lacks.
///
/// # Errors
///
/// Returns [`BodsError::MissingColumn`] naming `table` and the column.
pub fn require_columns(df: &DataFrame, table: TableKind, required: &[&str]) -> Result<()> {
    match required
        .iter()
        .find(|name| df.get_column_index(name).is_none())
    {
        Some(missing) => Err(BodsError::MissingColumn {
            table: table.to_string(),
            column: (*missing).to_owned(),
        }),
        None => Ok(()),
    }
}

/// Values of a column as text labels; nulls stay `None`.
///
/// Boolean columns are labelled `True` / `False`.
///
/// # Errors
///
/// Fails if the column is absent or cannot be cast to text.
pub fn category_values(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    let series = df.column(column)?.as_materialized_series();
    if series.dtype().is_bool() {
        return Ok(series
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| flag_label(b).to_owned()))
            .collect());
    }
    let text = series.cast(&DataType::String)?;
    Ok(text
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_owned))
        .collect())
}

/// Values of a yes/no column. Text cells read `true` / `false` in any case;
/// anything else counts as missing.
///
/// # Errors
///
/// Fails if the column is absent or cannot be cast to text.
pub fn flag_values(df: &DataFrame, column: &str) -> Result<Vec<Option<bool>>> {
    let series = df.column(column)?.as_materialized_series();
    if series.dtype().is_bool() {
        return Ok(series.bool()?.into_iter().collect());
    }
    let text = series.cast(&DataType::String)?;
    Ok(text
        .str()?
        .into_iter()
        .map(|v| match v.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        })
        .collect())
}

/// Values of a numeric column; an absent column reads as all-null and
/// unparseable cells as null.
///
/// # Errors
///
/// Fails if the column cannot be cast to a float.
pub fn float_values(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>> {
    if df.get_column_index(column).is_none() {
        return Ok(vec![None; df.height()]);
    }
    let series = df.column(column)?.as_materialized_series();
    let floats: Vec<Option<f64>> = if series.dtype().is_string() {
        series.str()?.into_iter().map(|v| v.and_then(|s| s.trim().parse::<f64>().ok())).collect()
    } else {
        let cast = series.cast(&DataType::Float64)?;
        cast.f64()?.into_iter().collect()
    };
    Ok(floats)
}

pub fn flag_label(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(columns: Vec<Column>) -> DataFrame {
        DataFrame::new(columns).expect("valid frame")
    }

    #[test]
    fn test_require_columns_names_missing_column() {
        let df = frame(vec![Column::from(Series::new(
            columns::LINK.into(),
            vec!["/1/ooc/0"],
        ))]);
        assert!(require_columns(&df, TableKind::OwnershipStatements, &[columns::LINK]).is_ok());

        let err = require_columns(
            &df,
            TableKind::OwnershipStatements,
            &[columns::LINK, columns::SUBJECT_ENTITY],
        )
        .expect_err("subject column is absent");
        assert_eq!(
            err.to_string(),
            "Table 'ooc' has no column 'subject_describedByEntityStatement'"
        );
    }

    #[test]
    fn test_flag_values_from_text_and_bool() -> Result<()> {
        let text = frame(vec![Column::from(Series::new(
            "bo".into(),
            vec![Some("True"), Some("false"), None, Some("maybe")],
        ))]);
        assert_eq!(
            flag_values(&text, "bo")?,
            vec![Some(true), Some(false), None, None]
        );

        let flags = frame(vec![Column::from(Series::new(
            "bo".into(),
            vec![Some(true), None],
        ))]);
        assert_eq!(flag_values(&flags, "bo")?, vec![Some(true), None]);
        assert_eq!(
            category_values(&flags, "bo")?,
            vec![Some("True".to_owned()), None]
        );
        Ok(())
    }

    #[test]
    fn test_float_values_absent_and_text() -> Result<()> {
        let df = frame(vec![Column::from(Series::new(
            columns::SHARE_EXACT.into(),
            vec![Some("25"), Some("n/a"), None],
        ))]);
        assert_eq!(
            float_values(&df, columns::SHARE_EXACT)?,
            vec![Some(25.0), None, None]
        );
        assert_eq!(float_values(&df, columns::SHARE_MAXIMUM)?, vec![None, None, None]);
        Ok(())
    }

    #[test]
    fn test_load_dir_finds_tables_by_either_stem() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(
            dir.path().join("ownershipOrControlStatement.csv"),
            "_link,statementID\n/1/ooc/0,s1\n",
        )?;
        std::fs::write(dir.path().join("ooes.csv"), "statementID,name\ne1,Acme\n")?;

        let tables = StatementTables::load_dir(dir.path())?;
        assert_eq!(tables.require(TableKind::OwnershipStatements)?.height(), 1);
        assert_eq!(tables.require(TableKind::EntityStatements)?.height(), 1);
        assert!(matches!(
            tables.require(TableKind::Interests),
            Err(BodsError::MissingTable(_))
        ));
        Ok(())
    }

    #[test]
    fn test_load_dir_rejects_file() {
        let result = StatementTables::load_dir(Path::new("Cargo.toml"));
        assert!(matches!(result, Err(BodsError::InvalidPath(_))));
    }
}
