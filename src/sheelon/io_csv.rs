// Primitives for reading survey exports in CSV format.

use std::io::Read;

use crate::sheelon::*;

/// A survey export, with all its data rows in memory.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SurveyFile {
    pub header: SurveyHeader,
    pub rows: Vec<Vec<String>>,
}

pub fn read_survey(path: &str, type_row: bool) -> SheelonResult<SurveyFile> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(OpeningCsvSnafu { path })?;
    read_records(rdr, path, type_row)
}

pub fn read_survey_from<R: Read>(input: R, path: &str, type_row: bool) -> SheelonResult<SurveyFile> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    read_records(rdr, path, type_row)
}

fn read_records<R: Read>(
    rdr: csv::Reader<R>,
    path: &str,
    type_row: bool,
) -> SheelonResult<SurveyFile> {
    let mut records: Vec<Vec<String>> = Vec::new();
    // The index starts at 1 to match the line numbers of the file
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        records.push(line.iter().map(|s| s.to_string()).collect());
    }

    // Exports made for spreadsheets start with a byte order mark.
    if let Some(first) = records.first_mut().and_then(|r| r.first_mut()) {
        if let Some(stripped) = first.strip_prefix('\u{feff}') {
            *first = stripped.to_string();
        }
    }

    let num_header_rows = if type_row { 3 } else { 2 };
    ensure!(
        records.len() >= num_header_rows,
        MissingHeaderSnafu {
            path,
            expected: num_header_rows,
            found: records.len()
        }
    );
    let rows = records.split_off(num_header_rows);
    debug!("read_records: header: {:?}", records);

    let header = SurveyHeader::from_rows(
        &records[0],
        &records[1],
        records.get(2).map(|r| r.as_slice()),
    );
    Ok(SurveyFile { header, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_rows() {
        let input = "\u{feff}Respondent ID,מדד  אמון,\n,a,\"b, c\"\n1,4,5\n2,,3,extra\n";
        let survey = read_survey_from(input.as_bytes(), "test.csv", false).unwrap();
        assert_eq!(survey.header.titles, vec!["Respondent ID", "מדד אמון", ""]);
        assert_eq!(survey.header.sub_titles, vec!["", "a", "b, c"]);
        assert_eq!(survey.header.type_codes, None);
        assert_eq!(survey.rows.len(), 2);
        assert_eq!(survey.rows[1], vec!["2", "", "3", "extra"]);
    }

    #[test]
    fn type_row() {
        let input = "Q,S\n,a\nfilter, asc5 \n1,2\n";
        let survey = read_survey_from(input.as_bytes(), "test.csv", true).unwrap();
        assert_eq!(
            survey.header.type_codes,
            Some(vec!["filter".to_string(), "asc5".to_string()])
        );
        assert_eq!(survey.rows, vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn missing_header_rows() {
        let input = "Q,S\n,a\n";
        match read_survey_from(input.as_bytes(), "test.csv", true) {
            Err(SheelonError::MissingHeader {
                expected, found, ..
            }) => {
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            x => panic!("unexpected result {:?}", x),
        }
    }
}
