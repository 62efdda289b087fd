//! # bodsight
//!
//! Descriptive statistics over beneficial-ownership disclosures published in
//! the Beneficial Ownership Data Standard (BODS) and flattened into tables.
//!
//! A battery of queries summarises how the data is filled in: which interests
//! carry beneficial ownership, who the interested parties are, how shares are
//! disclosed and whether entities are named. Every query returns a
//! [`report::Report`], a table plus the charts drawn from it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bodsight::codelist::StaticCodelists;
//! use bodsight::queries::{QueryOptions, interest_types_by_beneficial_ownership};
//! use bodsight::statements::{StatementTables, TableKind};
//!
//! let tables = StatementTables::load_dir("data/bods".as_ref())?;
//! let report = interest_types_by_beneficial_ownership(
//!     tables.require(TableKind::Interests)?,
//!     tables.require(TableKind::OwnershipStatements)?,
//!     &StaticCodelists::bundled(),
//! )?;
//! println!("{}", report.table);
//! # Ok::<(), bodsight::error::BodsError>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`statements`]: loading the flattened statement tables
//! - [`codelist`]: codelists of the data standard, fetched or bundled
//! - [`queries`]: the reporting battery
//! - [`report`]: count tables, charts and their rendering
//! - [`config`]: persistent settings
//! - [`error`]: error types and handling utilities
//! - [`logging`]: tracing setup

#![warn(clippy::all, rust_2018_idioms)]

pub mod codelist;
pub mod config;
pub mod error;
#[cfg(feature = "gui")]
pub mod gui;
pub mod logging;
pub mod queries;
pub mod report;
pub mod statements;
