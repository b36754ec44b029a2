// The guessed structure of a survey, printed to help writing its type row.

use serde_json::{Map as JSMap, Value as JSValue};

use crate::sheelon::*;

fn code_of(column: &ColumnDescriptor) -> JSValue {
    JSValue::String(
        column
            .question_type
            .map(|t| t.code().to_string())
            .unwrap_or_default(),
    )
}

/// Builds the draft: the questions grouped by section with their guessed type,
/// and a type row aligned with the columns of the file.
///
/// Pick-N sections are listed as the array of their options.
pub fn draft_structure(columns: &[ColumnDescriptor]) -> JSValue {
    let mut sections: JSMap<String, JSValue> = JSMap::new();
    sections.insert(UNSECTIONED.to_string(), JSValue::Object(JSMap::new()));

    for column in columns.iter() {
        match column.kind() {
            ColumnKind::Technical => {}
            ColumnKind::Plain => {
                if let Some(JSValue::Object(m)) = sections.get_mut(UNSECTIONED) {
                    m.insert(column.column_name(), code_of(column));
                }
            }
            ColumnKind::Composite => {
                let section = column.section().unwrap_or(UNSECTIONED);
                let is_pick = section.contains(PICK_MARKER);
                let entry = sections.entry(section).or_insert_with(|| {
                    if is_pick {
                        JSValue::Array(Vec::new())
                    } else {
                        JSValue::Object(JSMap::new())
                    }
                });
                match entry {
                    JSValue::Array(v) => v.push(JSValue::String(column.label().to_string())),
                    JSValue::Object(m) => {
                        m.insert(column.label().to_string(), code_of(column));
                    }
                    _ => {}
                }
            }
        }
    }

    let type_row: Vec<JSValue> = columns.iter().map(code_of).collect();
    let mut res = JSMap::new();
    res.insert("sections".to_string(), JSValue::Object(sections));
    res.insert("type_row".to_string(), JSValue::Array(type_row));
    JSValue::Object(res)
}
