use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use survey_schema::*;

use crate::args::Args;

mod config_reader;
mod draft;
mod io_common;
mod io_csv;
mod io_metadata;
mod io_sqlite;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SheelonError {
    #[snafu(display("Cannot read csv file '{path}'"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Cannot read line {lineno} of '{path}'"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Header in '{path}' is malformed: expected {expected} header rows, found {found}"))]
    MissingHeader {
        path: String,
        expected: usize,
        found: usize,
    },
    #[snafu(display("Cannot read file '{path}' to make '{target}'"))]
    OpeningTemplate {
        source: std::io::Error,
        path: String,
        target: String,
    },
    #[snafu(display("Cannot parse the dashboard template '{path}'"))]
    ParsingTemplate {
        source: serde_yaml::Error,
        path: String,
    },
    #[snafu(display("Invalid survey: {source}"))]
    Schema { source: SchemaError },
    #[snafu(display("Cannot use '{path}' as a database file"))]
    Database {
        source: rusqlite::Error,
        path: String,
    },
    #[snafu(display("Cannot write '{path}'"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Cannot serialize the metadata"))]
    SerializingYaml { source: serde_yaml::Error },
    #[snafu(display("Cannot read reference file '{path}'"))]
    OpeningReference {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SheelonResult<T> = Result<T, SheelonError>;

/// Runs the whole processing of a survey export.
///
/// Nothing is written before the schema, the scores and the dashboard have all
/// been computed.
pub fn run(args: &Args) -> SheelonResult<()> {
    let survey = io_csv::read_survey(&args.input, args.type_row)?;
    info!(
        "Read {} columns and {} rows from {:?}",
        survey.header.titles.len(),
        survey.rows.len(),
        args.input
    );

    if args.draft {
        let columns = draft_columns(&survey.header, &survey.rows).context(SchemaSnafu {})?;
        let structure = draft::draft_structure(&columns);
        let yaml = serde_yaml::to_string(&structure).context(SerializingYamlSnafu {})?;
        println!("{}", yaml);
        return Ok(());
    }

    let schema = infer_schema(&survey.header, &survey.rows).context(SchemaSnafu {})?;
    let data = load_rows(&schema, &survey.header, &survey.rows).context(SchemaSnafu {})?;

    let template_path = io_common::prefixed_path(&args.metadata, &args.meta_prefix);
    let meta = config_reader::read_meta_metadata(&template_path, &args.metadata)?;
    let templates = config_reader::chart_templates(&meta);
    debug!("run: templates: {:?}", templates);
    let choice_columns = if templates.choice_clause.is_some() {
        detect_choice_columns(&schema, &survey.rows, &templates.choice_vocabulary)
    } else {
        Vec::new()
    };
    let dashboard = build_dashboard(&schema, &templates, &choice_columns).context(SchemaSnafu {})?;
    let metadata = io_metadata::assemble_metadata(&meta, &dashboard)?;
    let yaml = serde_yaml::to_string(&metadata).context(SerializingYamlSnafu {})?;

    let count = io_sqlite::write_table(
        &args.db_name,
        &args.table_name,
        &schema,
        &data,
        args.id_column.as_deref(),
    )?;
    info!(
        "Wrote {} rows to table {:?} in {:?}",
        count, args.table_name, args.db_name
    );
    io_metadata::write_metadata(&args.metadata, &yaml)?;
    info!("Wrote {} charts to {:?}", dashboard.charts.len(), args.metadata);

    // The reference metadata, if provided for comparison
    if let Some(reference_p) = &args.reference {
        if let Err(e) = io_metadata::check_reference(reference_p, &yaml) {
            warn!("Reference check failed: {}", e);
            return Err(e);
        }
    }
    Ok(())
}
