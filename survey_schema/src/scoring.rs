use log::debug;
use snafu::OptionExt;

use crate::classify::parse_whole;
use crate::config::*;

/// Collapses a 5-point answer to the 3-point scale: 1,2 -> 1, 3 -> 2, 4,5 -> 3.
///
/// Returns `None` for values outside 1..=5.
pub fn five_to_three(value: i64) -> Option<i64> {
    match value {
        1 | 2 => Some(1),
        3 => Some(2),
        4 | 5 => Some(3),
        _ => None,
    }
}

/// The mean of the values, rounded to the nearest integer. Ties are rounded
/// up: the mean of 2 and 3 is 3.
pub fn rounded_mean(values: &[i64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as i64;
    let sum: i64 = values.iter().sum();
    // floor((2 * sum + n) / (2 * n)) == floor(sum / n + 1/2)
    Some((2 * sum + n).div_euclid(2 * n))
}

impl Cell {
    /// Reads a raw cell according to the type of its column. Texts and
    /// choices stay texts, everything else is read as a number when possible.
    pub fn from_raw(raw: &str, question_type: Option<QuestionType>) -> Cell {
        let s = raw.trim();
        if s.is_empty() {
            return Cell::Null;
        }
        match question_type {
            Some(QuestionType::Text) | Some(QuestionType::Choice) => Cell::Text(s.to_string()),
            _ => {
                if let Some(x) = parse_whole(s) {
                    Cell::Integer(x)
                } else {
                    match s.parse::<f64>() {
                        Ok(x) if x.is_finite() => Cell::Real(x),
                        _ => Cell::Text(s.to_string()),
                    }
                }
            }
        }
    }

    fn display_value(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Integer(x) => x.to_string(),
            Cell::Real(x) => x.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }
}

/// Builds the typed data rows of the non-technical columns.
///
/// `first_row_number` is the line of the first data row in the source file.
/// Missing trailing cells are read as empty.
pub fn materialize_rows(
    schema: &SurveySchema,
    rows: &[Vec<String>],
    first_row_number: usize,
) -> Vec<DataRow> {
    let columns: Vec<(&ColumnDescriptor, String)> = schema
        .data_columns()
        .map(|c| (c, c.column_name()))
        .collect();
    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let values = columns
                .iter()
                .map(|(c, name)| {
                    let raw = row.get(c.position).map(|s| s.as_str()).unwrap_or("");
                    (name.clone(), Cell::from_raw(raw, c.question_type))
                })
                .collect();
            DataRow::new(first_row_number + idx, values)
        })
        .collect()
}

/// Scores every index group of every row.
///
/// The answers of descending sub-items are inverted (`6 - v`). Each sub-item
/// value is replaced by its 3-point value, and the 3-point value of the
/// rounded mean is added under the section title of the group. A row without
/// any answer in the group gets a null aggregate.
pub fn aggregate_scores(schema: &SurveySchema, rows: &mut [DataRow]) -> SchemaResult<()> {
    for group in schema.index_groups() {
        debug!(
            "aggregate_scores: scoring '{}' over {} rows",
            group.section,
            rows.len()
        );
        let members: Vec<(String, Option<QuestionType>)> = group
            .members
            .iter()
            .map(|c| (c.column_name(), c.question_type))
            .collect();
        for row in rows.iter_mut() {
            let mut answers: Vec<i64> = Vec::with_capacity(members.len());
            for (name, qt) in members.iter() {
                let cell = row.get(name).cloned().unwrap_or(Cell::Null);
                let value = match cell {
                    Cell::Null => continue,
                    Cell::Integer(v) if five_to_three(v).is_some() => v,
                    other => {
                        return ValueOutOfRangeSnafu {
                            row: row.row_number,
                            column: name.clone(),
                            value: other.display_value(),
                        }
                        .fail();
                    }
                };
                let aligned = if *qt == Some(QuestionType::Descending5) {
                    6 - value
                } else {
                    value
                };
                answers.push(aligned);
                let collapsed = five_to_three(aligned).context(ValueOutOfRangeSnafu {
                    row: row.row_number,
                    column: name.clone(),
                    value: aligned.to_string(),
                })?;
                row.set(name, Cell::Integer(collapsed));
            }
            let aggregate = match rounded_mean(&answers) {
                Some(mean) => Cell::Integer(five_to_three(mean).context(ValueOutOfRangeSnafu {
                    row: row.row_number,
                    column: group.section.clone(),
                    value: mean.to_string(),
                })?),
                None => Cell::Null,
            };
            row.set(&group.section, aggregate);
        }
    }
    Ok(())
}
