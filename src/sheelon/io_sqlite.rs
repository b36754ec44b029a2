// Writing the processed survey into a SQLite table.

use std::fs;
use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use crate::sheelon::*;

fn sql_type(question_type: Option<QuestionType>) -> &'static str {
    match question_type {
        Some(t) if t.is_ordinal() => "INTEGER",
        Some(QuestionType::Filter) => "NUMERIC",
        _ => "TEXT",
    }
}

fn sql_value(cell: Option<&Cell>) -> Value {
    match cell {
        Some(Cell::Integer(i)) => Value::Integer(*i),
        Some(Cell::Real(x)) => Value::Real(*x),
        Some(Cell::Text(s)) => Value::Text(s.clone()),
        Some(Cell::Null) | None => Value::Null,
    }
}

/// The columns of the table and their declared types: the row number, the data
/// columns in source order, then one score per index.
fn table_columns(schema: &SurveySchema) -> Vec<(String, &'static str)> {
    let mut columns = vec![(ROW_NUMBER_COLUMN.to_string(), "INTEGER")];
    columns.extend(
        schema
            .data_columns()
            .map(|c| (c.column_name(), sql_type(c.question_type))),
    );
    columns.extend(
        schema
            .index_groups()
            .map(|g| (g.section.clone(), "INTEGER")),
    );
    columns
}

/// Recreates the table `table` in the database file `db_path` and fills it
/// with the rows.
///
/// Returns the number of rows written.
pub fn write_table(
    db_path: &str,
    table: &str,
    schema: &SurveySchema,
    data: &[DataRow],
    id_column: Option<&str>,
) -> SheelonResult<usize> {
    let columns = table_columns(schema);
    let key = id_column.unwrap_or(ROW_NUMBER_COLUMN);
    if !columns.iter().any(|(name, _)| name == key) {
        whatever!("Cannot use {:?} as the id column: no such column", key);
    }

    if Path::new(db_path).exists() {
        fs::remove_file(db_path).context(WritingOutputSnafu { path: db_path })?;
    }
    let mut conn = Connection::open(db_path).context(DatabaseSnafu { path: db_path })?;

    let decls: Vec<String> = columns
        .iter()
        .map(|(name, tpe)| {
            let pk = if name == key { " PRIMARY KEY" } else { "" };
            format!("{} {}{}", quote_identifier(name), tpe, pk)
        })
        .collect();
    let create = format!(
        "CREATE TABLE {} ({})",
        quote_identifier(table),
        decls.join(", ")
    );
    debug!("write_table: {}", create);
    conn.execute_batch(&create)
        .context(DatabaseSnafu { path: db_path })?;

    let placeholders = vec!["?"; columns.len()].join(", ");
    let insert = format!(
        "INSERT INTO {} VALUES ({})",
        quote_identifier(table),
        placeholders
    );

    let tx = conn
        .transaction()
        .context(DatabaseSnafu { path: db_path })?;
    {
        let mut stmt = tx.prepare(&insert).context(DatabaseSnafu { path: db_path })?;
        for row in data.iter() {
            let mut values: Vec<Value> = Vec::with_capacity(columns.len());
            values.push(Value::Integer(row.row_number as i64));
            for (name, _) in columns.iter().skip(1) {
                values.push(sql_value(row.get(name)));
            }
            stmt.execute(params_from_iter(values))
                .context(DatabaseSnafu { path: db_path })?;
        }
    }
    tx.commit().context(DatabaseSnafu { path: db_path })?;
    Ok(data.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> (SurveySchema, Vec<DataRow>) {
        let header = SurveyHeader::from_rows(
            &strings(&["Respondent ID", "Start Date", "מדד", "", "Comments"]),
            &strings(&["", "", "a", "b", "Response"]),
            Some(&strings(&["filter", "", "asc5", "asc5", "text"])),
        );
        let rows = vec![
            strings(&["7", "2024-01-01", "5", "5", "good"]),
            strings(&["8", "2024-01-02", "1", "", ""]),
        ];
        let schema = infer_schema(&header, &rows).unwrap();
        let data = load_rows(&schema, &header, &rows).unwrap();
        (schema, data)
    }

    #[test]
    fn write_rows() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("t.db").display().to_string();
        // An existing file is replaced.
        fs::write(&db, "not a database").unwrap();
        let (schema, data) = sample();
        assert_eq!(write_table(&db, "answers", &schema, &data, None).unwrap(), 2);

        let conn = Connection::open(&db).unwrap();
        let (rn, score, comment): (i64, i64, String) = conn
            .query_row(
                "SELECT row_number, \"מדד\", Comments FROM answers WHERE \"Respondent ID\" = 7",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!((rn, score, comment), (4, 3, "good".to_string()));
        let empty: Option<String> = conn
            .query_row("SELECT Comments FROM answers WHERE row_number = 5", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(empty, None);
    }

    #[test]
    fn id_column() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("t.db").display().to_string();
        let (schema, data) = sample();
        write_table(&db, "answers", &schema, &data, Some("Respondent ID")).unwrap();

        let res = write_table(&db, "answers", &schema, &data, Some("Start Date"));
        assert!(matches!(res, Err(SheelonError::Whatever { .. })));
    }
}
