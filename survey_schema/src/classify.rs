use log::{debug, warn};
use snafu::OptionExt;
use std::collections::BTreeSet;

use crate::config::*;

/// Assigns a question type to every non-technical column.
///
/// With an explicit type row, the codes are authoritative. Without one, the
/// types are guessed from the values of all the data rows. The guess is only
/// a draft to start a hand-written type row from.
pub fn classify_columns(
    header: &SurveyHeader,
    columns: Vec<ColumnDescriptor>,
    rows: &[Vec<String>],
) -> SchemaResult<Vec<ColumnDescriptor>> {
    if header.type_codes.is_none() {
        warn!("classify_columns: no type row, the question types are guessed from the data");
    }
    let mut res: Vec<ColumnDescriptor> = Vec::with_capacity(columns.len());
    for mut col in columns {
        if col.kind() != ColumnKind::Technical {
            let qt = match &header.type_codes {
                Some(codes) => {
                    let code = &codes[col.position];
                    QuestionType::from_code(code).context(InvalidQuestionTypeSnafu {
                        code: code.clone(),
                        row: TYPE_ROW,
                        column: col.position + 1,
                    })?
                }
                None => guess_type(&col, rows),
            };
            debug!("classify_columns: {:?} -> {:?}", col.column_name(), qt);
            col.question_type = Some(qt);
        }
        res.push(col);
    }
    Ok(res)
}

fn guess_type(col: &ColumnDescriptor, rows: &[Vec<String>]) -> QuestionType {
    match &col.key {
        // The options of a pick-N question are only ever picked or not.
        ColumnKey::Composite(k) if k.section.contains(PICK_MARKER) => {
            if k.sub_title.contains(OTHER_MARKER) {
                QuestionType::Text
            } else {
                QuestionType::Choice
            }
        }
        _ => infer_type(&distinct_values(rows, col.position)),
    }
}

/// The distinct non-empty values of a column.
pub fn distinct_values(rows: &[Vec<String>], position: usize) -> BTreeSet<String> {
    rows.iter()
        .filter_map(|row| row.get(position))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Guesses the type of a question from its distinct answers.
///
/// Whole numbers within 1..=3 make a 3-point scale. Otherwise, at most 5
/// distinct answers make a 5-point scale, assumed ascending. Anything else
/// is free text.
pub fn infer_type(values: &BTreeSet<String>) -> QuestionType {
    if values.is_empty() {
        return QuestionType::Text;
    }
    let whole_numbers: Option<BTreeSet<i64>> = values.iter().map(|s| parse_whole(s)).collect();
    let num_distinct = match whole_numbers {
        Some(numbers) if numbers.iter().all(|x| (1..=3).contains(x)) => {
            return QuestionType::Ordinal3;
        }
        // "1" and "1.0" are the same answer.
        Some(numbers) => numbers.len(),
        None => values.len(),
    };
    if num_distinct <= 5 {
        QuestionType::Ascending5
    } else {
        QuestionType::Text
    }
}

pub(crate) fn parse_whole(s: &str) -> Option<i64> {
    if let Ok(x) = s.parse::<i64>() {
        return Some(x);
    }
    match s.parse::<f64>() {
        Ok(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < i64::MAX as f64 => Some(x as i64),
        _ => None,
    }
}
