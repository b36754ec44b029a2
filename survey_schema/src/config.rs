// ********* Input data structures ***********

use std::collections::HashMap;

use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use snafu::Snafu;

/// Lead-in phrase that marks a visual break between sections. It is not a
/// section title: seeing it resets the carried title.
pub const SECTION_BREAK_PHRASE: &str = "אנא ענו על השאלות הבאות";

/// Substring of the second header row that marks a free response field. The
/// question then lives entirely in the first row.
pub const FREE_RESPONSE_MARKER: &str = "Response";

/// Substring of a section title that marks a "pick N options" question.
pub const PICK_MARKER: &str = "בחר/י";

/// Substring of a sub-title that marks the free text "other" escape of a
/// pick-N question.
pub const OTHER_MARKER: &str = "אחר";

/// Joins the section title and the sub-title of a composite column in the
/// external column name.
pub const SEPARATOR: char = '÷';

/// Escapes the separator (and itself) inside the fields of a composite column name.
pub const ESCAPE: char = '\\';

/// Name of the bucket of questions that are not in any section.
pub const UNSECTIONED: &str = "-מחוץ לפרק-";

/// Name of the synthetic row key added to every data row.
pub const ROW_NUMBER_COLUMN: &str = "row_number";

/// Filler for the empty slot of a layout row.
pub const LAYOUT_FILLER: &str = ".";

/// 1-based header row holding the explicit type codes, when present.
pub const TYPE_ROW: usize = 3;

/// Bookkeeping columns added by the survey platform. They are ignored when no
/// explicit type row is given.
pub const TECHNICAL_COLUMNS: &[&str] = &[
    "Collector ID",
    "Start Date",
    "End Date",
    "IP Address",
    "Email Address",
    "First Name",
    "Last Name",
    "Custom Data 1",
];

/// The header rows of a survey export, normalized.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SurveyHeader {
    pub titles: Vec<String>,
    pub sub_titles: Vec<String>,
    /// The optional third row of explicit type codes.
    pub type_codes: Option<Vec<String>>,
}

/// The semantic type of a question.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum QuestionType {
    /// 5-point scale, 5 is the most favorable answer.
    Ascending5,
    /// 5-point scale, 1 is the most favorable answer.
    Descending5,
    /// One option of a multi-select question: the cell holds the option label
    /// when it was picked.
    Choice,
    Text,
    /// Numbers or short texts, only useful to filter on.
    Filter,
    /// 3-point scale. Only produced by inference, it has no explicit code.
    Ordinal3,
}

impl QuestionType {
    /// Reads an explicit type code. Blank codes are not types (they mark
    /// technical columns) and are rejected like any unknown code.
    pub fn from_code(code: &str) -> Option<QuestionType> {
        match code.trim().to_lowercase().as_str() {
            "asc5" => Some(QuestionType::Ascending5),
            "desc5" => Some(QuestionType::Descending5),
            "choice" => Some(QuestionType::Choice),
            "text" => Some(QuestionType::Text),
            "filter" => Some(QuestionType::Filter),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            QuestionType::Ascending5 => "asc5",
            QuestionType::Descending5 => "desc5",
            QuestionType::Choice => "choice",
            QuestionType::Text => "text",
            QuestionType::Filter => "filter",
            QuestionType::Ordinal3 => "ord3",
        }
    }

    pub fn is_ordinal(&self) -> bool {
        matches!(
            self,
            QuestionType::Ascending5 | QuestionType::Descending5 | QuestionType::Ordinal3
        )
    }

    /// Whether the values can enter an index score. A guessed 3-point scale is
    /// a 5-point question whose answers all fell in 1..=3, scored as ascending.
    pub fn is_scored(&self) -> bool {
        self.is_ordinal()
    }
}

/// The identity of a composite column: a sub-question inside a section.
///
/// The external name joins both fields with [`SEPARATOR`]. Occurrences of the
/// separator or of [`ESCAPE`] inside the fields are escaped, so that distinct
/// keys never share a name.
#[derive(Eq, PartialEq, Debug, Clone, Hash, PartialOrd, Ord)]
pub struct CompositeKey {
    pub section: String,
    pub sub_title: String,
}

impl CompositeKey {
    pub fn new(section: &str, sub_title: &str) -> CompositeKey {
        CompositeKey {
            section: section.to_string(),
            sub_title: sub_title.to_string(),
        }
    }

    pub fn column_name(&self) -> String {
        format!(
            "{}{}{}",
            escape_field(&self.section),
            SEPARATOR,
            escape_field(&self.sub_title)
        )
    }

    /// Reads back a name produced by [`CompositeKey::column_name`].
    pub fn parse(name: &str) -> Option<CompositeKey> {
        let mut fields: Vec<String> = vec![String::new()];
        let mut chars = name.chars();
        while let Some(c) = chars.next() {
            match c {
                ESCAPE => fields.last_mut()?.push(chars.next()?),
                SEPARATOR => fields.push(String::new()),
                _ => fields.last_mut()?.push(c),
            }
        }
        match fields.as_slice() {
            [section, sub_title] => Some(CompositeKey::new(section, sub_title)),
            _ => None,
        }
    }
}

fn escape_field(field: &str) -> String {
    let mut res = String::with_capacity(field.len());
    for c in field.chars() {
        if c == ESCAPE || c == SEPARATOR {
            res.push(ESCAPE);
        }
        res.push(c);
    }
    res
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ColumnKind {
    /// Kept for position alignment, excluded from every later stage.
    Technical,
    Plain,
    Composite,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum ColumnKey {
    Technical(String),
    Plain(String),
    Composite(CompositeKey),
}

impl ColumnKey {
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnKey::Technical(_) => ColumnKind::Technical,
            ColumnKey::Plain(_) => ColumnKind::Plain,
            ColumnKey::Composite(_) => ColumnKind::Composite,
        }
    }

    /// The name of the column in the data rows and in the generated queries.
    pub fn column_name(&self) -> String {
        match self {
            ColumnKey::Technical(s) | ColumnKey::Plain(s) => s.clone(),
            ColumnKey::Composite(k) => k.column_name(),
        }
    }
}

/// The resolved identity of one data column.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnDescriptor {
    /// 0-based position in the source file.
    pub position: usize,
    pub key: ColumnKey,
    /// Filled by the classifier. Technical columns never get a type.
    pub question_type: Option<QuestionType>,
}

impl ColumnDescriptor {
    pub fn kind(&self) -> ColumnKind {
        self.key.kind()
    }

    pub fn column_name(&self) -> String {
        self.key.column_name()
    }

    pub fn section(&self) -> Option<&str> {
        match &self.key {
            ColumnKey::Composite(k) => Some(k.section.as_str()),
            _ => None,
        }
    }

    /// The sub-title for composite columns, the full name otherwise.
    pub fn label(&self) -> &str {
        match &self.key {
            ColumnKey::Technical(s) | ColumnKey::Plain(s) => s.as_str(),
            ColumnKey::Composite(k) => k.sub_title.as_str(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum GroupRole {
    /// Ordinal sub-questions scored into one aggregate.
    Index,
    /// Boolean options of a multi-select question.
    OptionSet,
    /// Any other run of sub-questions sharing a section title.
    Section,
}

/// Consecutive composite columns sharing one section title.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CompositeGroup {
    pub section: String,
    pub role: GroupRole,
    /// Position of the first member, used to order the charts.
    pub first_position: usize,
    pub members: Vec<ColumnDescriptor>,
}

impl CompositeGroup {
    pub fn member_names(&self) -> Vec<String> {
        self.members.iter().map(|c| c.column_name()).collect()
    }

    /// The options of an option set, without the free text passengers.
    pub fn options(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.members
            .iter()
            .filter(|c| c.question_type == Some(QuestionType::Choice))
    }
}

/// The column catalog of one input file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SurveySchema {
    pub columns: Vec<ColumnDescriptor>,
    pub groups: Vec<CompositeGroup>,
}

impl SurveySchema {
    /// All the columns that are not technical, in source order.
    pub fn data_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns
            .iter()
            .filter(|c| c.kind() != ColumnKind::Technical)
    }

    pub fn index_groups(&self) -> impl Iterator<Item = &CompositeGroup> {
        self.groups.iter().filter(|g| g.role == GroupRole::Index)
    }

    pub fn option_sets(&self) -> impl Iterator<Item = &CompositeGroup> {
        self.groups.iter().filter(|g| g.role == GroupRole::OptionSet)
    }
}

// ******** Row data *********

/// A typed cell value, shaped for insertion into a table.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// One data row: the values of all the non-technical columns, in column order,
/// followed by the aggregates of the index groups.
#[derive(PartialEq, Debug, Clone)]
pub struct DataRow {
    /// The 1-based line of the row in the source file.
    pub row_number: usize,
    values: Vec<(String, Cell)>,
    // Column name -> slot in `values`.
    index: HashMap<String, usize>,
}

impl DataRow {
    pub fn new(row_number: usize, values: Vec<(String, Cell)>) -> DataRow {
        let index = values
            .iter()
            .enumerate()
            .map(|(idx, (name, _))| (name.clone(), idx))
            .collect();
        DataRow {
            row_number,
            values,
            index,
        }
    }

    /// The values, in column order.
    pub fn values(&self) -> &[(String, Cell)] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.index.get(column).map(|idx| &self.values[*idx].1)
    }

    /// Replaces the value of an existing column, or appends a new column.
    pub fn set(&mut self, column: &str, cell: Cell) {
        match self.index.get(column) {
            Some(idx) => self.values[*idx].1 = cell,
            None => {
                self.index.insert(column.to_string(), self.values.len());
                self.values.push((column.to_string(), cell));
            }
        }
    }
}

// ******** Dashboard templates and output *********

/// The chart skeletons and query clause templates filled in by the dashboard
/// builder. Clause templates use `{placeholder}` parameters.
#[derive(PartialEq, Debug, Clone)]
pub struct ChartTemplates {
    /// Prepended to every generated query.
    pub query_preamble: String,
    /// One clause per index aggregate: `{field_name}`, `{field_label}`.
    pub main_metric_clause: String,
    /// One clause per index sub-item: `{field_name}`, `{sub_field_name}`.
    pub sub_metric_clause: String,
    /// One clause per option: `{field_name}`, `{option_name}`.
    pub option_clause: Option<String>,
    /// One clause per choice question: `{field_name}`, `{field_label}`.
    pub choice_clause: Option<String>,
    pub metrics_chart: JSMap<String, JSValue>,
    /// Falls back to the metrics skeleton.
    pub options_chart: Option<JSMap<String, JSValue>>,
    /// Falls back to the metrics skeleton.
    pub choice_chart: Option<JSMap<String, JSValue>>,
    /// The closed set of answers that makes a plain question a choice question.
    pub choice_vocabulary: Vec<String>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ChartSpec {
    pub id: String,
    /// When missing, the title of the skeleton is kept.
    pub title: Option<String>,
    pub query: String,
    /// The skeleton the chart was built from.
    pub display: JSMap<String, JSValue>,
}

impl ChartSpec {
    pub fn to_json(&self) -> JSValue {
        let mut obj = self.display.clone();
        if let Some(title) = &self.title {
            obj.insert("title".to_string(), JSValue::String(title.clone()));
        }
        obj.insert("query".to_string(), JSValue::String(self.query.clone()));
        JSValue::Object(obj)
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct DashboardSpec {
    /// In generation order: aggregate, details, option sets, choices.
    pub charts: Vec<ChartSpec>,
    pub layout: Vec<[String; 2]>,
}

// ******** Errors *********

/// Errors that abort the processing of a survey file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SchemaError {
    #[snafu(display(
        "Malformed header: {titles} cells in the first row but {sub_titles} in the second row"
    ))]
    HeaderLengthMismatch { titles: usize, sub_titles: usize },

    #[snafu(display("Malformed header: {codes} type codes for {columns} columns"))]
    TypeRowLengthMismatch { codes: usize, columns: usize },

    #[snafu(display("Malformed header: two questions '{name}' under '{section}' (column {column})"))]
    DuplicateQuestion {
        section: String,
        name: String,
        column: usize,
    },

    #[snafu(display("Invalid question type '{code}' in row {row}, column {column}"))]
    InvalidQuestionType {
        code: String,
        row: usize,
        column: usize,
    },

    #[snafu(display(
        "Inconsistent group '{group}': member '{member}' has type '{found}', expected {expected}"
    ))]
    InconsistentGroup {
        group: String,
        member: String,
        found: String,
        expected: String,
    },

    #[snafu(display("Value out of range in row {row}, column '{column}': '{value}'"))]
    ValueOutOfRange {
        row: usize,
        column: String,
        value: String,
    },

    #[snafu(display("The chart template is missing '{field}'"))]
    MissingTemplateField { field: String },
}

pub type SchemaResult<T> = Result<T, SchemaError>;
