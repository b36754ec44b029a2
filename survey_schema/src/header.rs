use log::debug;
use snafu::ensure;
use std::collections::HashSet;

use crate::config::*;

/// Collapses every run of whitespace into a single space and trims the ends.
pub fn normalize(cell_text: &str) -> String {
    cell_text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

impl SurveyHeader {
    /// Builds a header from the raw header rows of a file.
    pub fn from_rows(
        titles: &[String],
        sub_titles: &[String],
        type_codes: Option<&[String]>,
    ) -> SurveyHeader {
        SurveyHeader {
            titles: titles.iter().map(|s| normalize(s)).collect(),
            sub_titles: sub_titles.iter().map(|s| normalize(s)).collect(),
            type_codes: type_codes.map(|codes| codes.iter().map(|s| s.trim().to_string()).collect()),
        }
    }

    /// The number of rows taken by the header in the source file.
    pub fn num_rows(&self) -> usize {
        if self.type_codes.is_some() {
            3
        } else {
            2
        }
    }
}

/// Resolves the section title of each cell of the first row.
///
/// An empty cell inherits the last non-empty title on its left. The section
/// break phrase resets the carried title to empty.
pub fn carry_forward<S: AsRef<str>>(titles: &[S]) -> Vec<String> {
    titles
        .iter()
        .scan(String::new(), |carried, title| {
            let title = title.as_ref();
            if title.contains(SECTION_BREAK_PHRASE) {
                carried.clear();
            } else if !title.is_empty() {
                *carried = title.to_string();
            }
            Some(carried.clone())
        })
        .collect()
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum CellShape {
    Technical,
    // The question is entirely in the first row.
    FirstRow,
    // The first row is (or inherits) a section title, the second row holds the question.
    Sectioned,
}

fn has_sub_question(sub_title: &str) -> bool {
    !sub_title.is_empty() && !sub_title.contains(FREE_RESPONSE_MARKER)
}

fn cell_shape(header: &SurveyHeader, idx: usize) -> CellShape {
    let title = header.titles[idx].as_str();
    let sub_title = header.sub_titles[idx].as_str();
    match &header.type_codes {
        Some(codes) if codes[idx].is_empty() => return CellShape::Technical,
        None if TECHNICAL_COLUMNS.contains(&title) => return CellShape::Technical,
        _ => {}
    }
    if title.is_empty() && sub_title.is_empty() {
        CellShape::Technical
    } else if !has_sub_question(sub_title) {
        CellShape::FirstRow
    } else {
        CellShape::Sectioned
    }
}

/// Turns the header rows into one descriptor per column, in column order.
///
/// Types are not resolved at this stage.
pub fn parse_columns(header: &SurveyHeader) -> SchemaResult<Vec<ColumnDescriptor>> {
    let num_columns = header.titles.len();
    ensure!(
        num_columns == header.sub_titles.len(),
        HeaderLengthMismatchSnafu {
            titles: num_columns,
            sub_titles: header.sub_titles.len()
        }
    );
    if let Some(codes) = &header.type_codes {
        ensure!(
            codes.len() == num_columns,
            TypeRowLengthMismatchSnafu {
                codes: codes.len(),
                columns: num_columns
            }
        );
    }

    let shapes: Vec<CellShape> = (0..num_columns).map(|idx| cell_shape(header, idx)).collect();

    // Every cell holding a sub-question takes part in the carry, including the
    // ones marked technical by the type row: their title still opens a section.
    let carriers: Vec<usize> = (0..num_columns)
        .filter(|idx| has_sub_question(&header.sub_titles[*idx]))
        .collect();
    let carried = carry_forward(
        &carriers
            .iter()
            .map(|idx| header.titles[*idx].as_str())
            .collect::<Vec<&str>>(),
    );
    let mut sections: Vec<String> = vec![String::new(); num_columns];
    for (idx, section) in carriers.into_iter().zip(carried) {
        sections[idx] = section;
    }

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut res: Vec<ColumnDescriptor> = Vec::with_capacity(num_columns);
    for (idx, shape) in shapes.iter().enumerate() {
        let title = &header.titles[idx];
        let sub_title = &header.sub_titles[idx];
        let key = match shape {
            CellShape::Technical => ColumnKey::Technical(title.clone()),
            CellShape::FirstRow => ColumnKey::Plain(title.clone()),
            CellShape::Sectioned if sections[idx].is_empty() => ColumnKey::Plain(sub_title.clone()),
            CellShape::Sectioned => ColumnKey::Composite(CompositeKey::new(&sections[idx], sub_title)),
        };
        let scope = match &key {
            ColumnKey::Technical(_) => None,
            ColumnKey::Plain(name) => Some((UNSECTIONED.to_string(), name.clone())),
            ColumnKey::Composite(k) => Some((k.section.clone(), k.sub_title.clone())),
        };
        if let Some((section, name)) = scope {
            ensure!(
                !seen.contains(&(section.clone(), name.clone())),
                DuplicateQuestionSnafu {
                    section: section.clone(),
                    name: name.clone(),
                    column: idx + 1
                }
            );
            seen.insert((section, name));
        }
        debug!("parse_columns: column {}: {:?}", idx + 1, key);
        res.push(ColumnDescriptor {
            position: idx,
            key,
            question_type: None,
        });
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn header(titles: &[&str], sub_titles: &[&str]) -> SurveyHeader {
        SurveyHeader::from_rows(&strings(titles), &strings(sub_titles), None)
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize("  how   are\n you\t"), "how are you");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \t "), "");
    }

    #[test]
    fn carry_forward_fills_gaps() {
        assert_eq!(carry_forward(&["A", "", "", "B"]), strings(&["A", "A", "A", "B"]));
        assert_eq!(carry_forward(&["", "A"]), strings(&["", "A"]));
    }

    #[test]
    fn carry_forward_section_break() {
        let titles = [
            "A",
            "",
            "אנא ענו על השאלות הבאות בכנות",
            "",
            "B",
        ];
        assert_eq!(carry_forward(&titles), strings(&["A", "A", "", "", "B"]));
    }

    #[test]
    fn positions_are_contiguous() {
        let h = header(&["Q1", "Q2", "S", "", ""], &["", "Open-Ended Response", "a", "b", "c"]);
        let cols = parse_columns(&h).unwrap();
        assert_eq!(cols.len(), 5);
        let positions: Vec<usize> = cols.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn composite_and_plain_columns() {
        let h = header(
            &["Respondent ID", "Age", "Index A", "", "אנא ענו על השאלות הבאות", ""],
            &["", "Response", "x", "y", "solo", "other"],
        );
        let cols = parse_columns(&h).unwrap();
        let keys: Vec<ColumnKey> = cols.into_iter().map(|c| c.key).collect();
        assert_eq!(
            keys,
            vec![
                ColumnKey::Plain("Respondent ID".to_string()),
                ColumnKey::Plain("Age".to_string()),
                ColumnKey::Composite(CompositeKey::new("Index A", "x")),
                ColumnKey::Composite(CompositeKey::new("Index A", "y")),
                ColumnKey::Plain("solo".to_string()),
                ColumnKey::Plain("other".to_string()),
            ]
        );
    }

    #[test]
    fn plain_columns_do_not_feed_the_carry() {
        let h = header(&["S", "Age", ""], &["a", "", "b"]);
        let cols = parse_columns(&h).unwrap();
        assert_eq!(cols[2].key, ColumnKey::Composite(CompositeKey::new("S", "b")));
    }

    #[test]
    fn technical_title_still_opens_a_section() {
        let h = SurveyHeader::from_rows(
            &strings(&["S", "", "", "T", ""]),
            &strings(&["a", "b", "c", "a", "b"]),
            Some(&strings(&["", "asc5", "asc5", "asc5", "asc5"])),
        );
        let cols = parse_columns(&h).unwrap();
        assert_eq!(cols[0].kind(), ColumnKind::Technical);
        assert_eq!(cols[1].key, ColumnKey::Composite(CompositeKey::new("S", "b")));
        assert_eq!(cols[2].key, ColumnKey::Composite(CompositeKey::new("S", "c")));
        assert_eq!(cols[4].key, ColumnKey::Composite(CompositeKey::new("T", "b")));
    }

    #[test]
    fn technical_columns() {
        let h = header(&["Collector ID", "", "Q"], &["", "", ""]);
        let cols = parse_columns(&h).unwrap();
        assert_eq!(cols[0].kind(), ColumnKind::Technical);
        assert_eq!(cols[1].kind(), ColumnKind::Technical);
        assert_eq!(cols[2].kind(), ColumnKind::Plain);
    }

    #[test]
    fn blank_type_code_is_technical() {
        let h = SurveyHeader::from_rows(
            &strings(&["Collector ID", "Q", "S"]),
            &strings(&["", "", "a"]),
            Some(&strings(&["text", " ", "asc5"])),
        );
        let cols = parse_columns(&h).unwrap();
        let kinds: Vec<ColumnKind> = cols.iter().map(|c| c.kind()).collect();
        // The type row overrides the list of technical columns.
        assert_eq!(
            kinds,
            vec![ColumnKind::Plain, ColumnKind::Technical, ColumnKind::Composite]
        );
    }

    #[test]
    fn length_mismatch() {
        let h = header(&["A", "B"], &["x"]);
        assert!(matches!(
            parse_columns(&h),
            Err(SchemaError::HeaderLengthMismatch {
                titles: 2,
                sub_titles: 1
            })
        ));
        let h = SurveyHeader::from_rows(&strings(&["A"]), &strings(&["x"]), Some(&[]));
        assert!(matches!(
            parse_columns(&h),
            Err(SchemaError::TypeRowLengthMismatch { .. })
        ));
    }

    #[test]
    fn duplicate_plain_question() {
        let h = header(&["Age", "Age"], &["", "Response"]);
        match parse_columns(&h) {
            Err(SchemaError::DuplicateQuestion { name, column, .. }) => {
                assert_eq!(name, "Age");
                assert_eq!(column, 2);
            }
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn duplicate_in_section() {
        let h = header(&["S", "", "T"], &["a", "a", "a"]);
        match parse_columns(&h) {
            Err(SchemaError::DuplicateQuestion { section, name, .. }) => {
                assert_eq!(section, "S");
                assert_eq!(name, "a");
            }
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn unsectioned_bucket_shares_plain_names() {
        let h = header(&["Age", "אנא ענו על השאלות הבאות"], &["", "Age"]);
        assert!(matches!(
            parse_columns(&h),
            Err(SchemaError::DuplicateQuestion { .. })
        ));
    }
}
