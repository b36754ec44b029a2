mod classify;
mod config;
mod dashboard;
mod grouping;
mod header;
pub mod manual;
mod scoring;

use log::info;

pub use crate::classify::{classify_columns, distinct_values, infer_type};
pub use crate::config::*;
pub use crate::dashboard::{
    build_dashboard, detect_choice_columns, fill_template, layout_rows, quote_identifier,
    quote_literal, MAIN_METRICS_CHART,
};
pub use crate::grouping::group_columns;
pub use crate::header::{carry_forward, normalize, parse_columns};
pub use crate::scoring::{aggregate_scores, five_to_three, materialize_rows, rounded_mean};

/// Resolves and classifies the columns of a survey, without grouping them.
///
/// This is enough to draft a type row for a file that does not have one yet.
pub fn draft_columns(
    header: &SurveyHeader,
    rows: &[Vec<String>],
) -> SchemaResult<Vec<ColumnDescriptor>> {
    let columns = parse_columns(header)?;
    classify_columns(header, columns, rows)
}

/// Builds the column catalog of a survey.
///
/// Arguments:
/// * `header` the header rows of the file
/// * `rows` all the data rows. Without a type row in the header, the types of
/// the questions are guessed from the complete set of answers.
pub fn infer_schema(header: &SurveyHeader, rows: &[Vec<String>]) -> SchemaResult<SurveySchema> {
    let columns = draft_columns(header, rows)?;
    let groups = group_columns(&columns)?;
    let schema = SurveySchema { columns, groups };
    info!(
        "infer_schema: {} columns ({} data columns), {} indices, {} option sets",
        schema.columns.len(),
        schema.data_columns().count(),
        schema.index_groups().count(),
        schema.option_sets().count()
    );
    Ok(schema)
}

/// Builds the typed rows of a survey and adds the index scores to them.
///
/// The first data row is numbered after the header rows, so that row numbers
/// match the lines of the source file.
pub fn load_rows(
    schema: &SurveySchema,
    header: &SurveyHeader,
    rows: &[Vec<String>],
) -> SchemaResult<Vec<DataRow>> {
    let mut data = materialize_rows(schema, rows, header.num_rows() + 1);
    aggregate_scores(schema, &mut data)?;
    info!("load_rows: processed {} rows", data.len());
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn end_to_end() {
        init();
        let header = SurveyHeader::from_rows(
            &strings(&["Respondent ID", "Collector ID", "מדד אמון", "", "בחר/י עד 2", "", "", "Comments"]),
            &strings(&["", "", "a", "b", "X", "Y", "אחר", "Open-Ended Response"]),
            Some(&strings(&["filter", "", "asc5", "desc5", "choice", "choice", "text", "text"])),
        );
        let rows = vec![
            strings(&["11", "c1", "4", "2", "X", "", "", "fine"]),
            strings(&["12", "c1", "", "", "", "Y", "cats", ""]),
        ];
        let schema = infer_schema(&header, &rows).unwrap();
        assert_eq!(schema.columns.len(), 8);
        assert_eq!(schema.data_columns().count(), 7);
        assert_eq!(schema.index_groups().count(), 1);
        assert_eq!(schema.option_sets().count(), 1);

        let data = load_rows(&schema, &header, &rows).unwrap();
        assert_eq!(data[0].row_number, 4);
        assert_eq!(data[0].get("Respondent ID"), Some(&Cell::Integer(11)));
        assert_eq!(data[0].get("Collector ID"), None);
        // 4 and (6 - 2): both 4, collapsed to 3.
        assert_eq!(data[0].get("מדד אמון"), Some(&Cell::Integer(3)));
        assert_eq!(data[1].get("מדד אמון"), Some(&Cell::Null));
        assert_eq!(
            data[1].get(&CompositeKey::new("בחר/י עד 2", "אחר").column_name()),
            Some(&Cell::Text("cats".to_string()))
        );
    }

    #[test]
    fn guessed_index_with_low_answers() {
        init();
        let header = SurveyHeader::from_rows(&strings(&["מדד אמון", ""]), &strings(&["a", "b"]), None);
        for (second, score) in [("5", 3), ("3", 2)] {
            let rows = vec![strings(&["1", "2"]), strings(&["3", second])];
            let schema = infer_schema(&header, &rows).unwrap();
            assert_eq!(schema.index_groups().count(), 1);
            assert_eq!(
                schema.columns[0].question_type,
                Some(QuestionType::Ordinal3)
            );

            let data = load_rows(&schema, &header, &rows).unwrap();
            // Mean of 1 and 2 rounds up to 2, collapsed to 1.
            assert_eq!(data[0].get("מדד אמון"), Some(&Cell::Integer(1)));
            assert_eq!(data[1].get("מדד אמון"), Some(&Cell::Integer(score)));
        }
    }
}
