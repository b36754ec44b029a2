use log::{debug, info};
use snafu::OptionExt;

use crate::config::*;

/// Id of the chart summarizing all the index aggregates.
pub const MAIN_METRICS_CHART: &str = "main_metrics";

/// Escapes a name to be placed inside a double-quoted SQL identifier.
pub fn quote_identifier(name: &str) -> String {
    name.replace('"', "\"\"")
}

/// Escapes a text to be placed inside a single-quoted SQL literal.
pub fn quote_literal(text: &str) -> String {
    text.replace('\'', "''")
}

/// Replaces each `{key}` of the template by its value.
pub fn fill_template(template: &str, params: &[(&str, &str)]) -> String {
    let mut res = template.to_string();
    for (key, value) in params {
        res = res.replace(&format!("{{{}}}", key), value);
    }
    res
}

/// Packs chart ids two by two. An odd last id is paired with the filler.
pub fn layout_rows(ids: &[String]) -> Vec<[String; 2]> {
    ids.chunks(2)
        .map(|pair| match pair {
            [a, b] => [a.clone(), b.clone()],
            [a] => [a.clone(), LAYOUT_FILLER.to_string()],
            _ => unreachable!("chunks of 2"),
        })
        .collect()
}

/// The plain questions whose answers all belong to the vocabulary.
///
/// Questions without any answer are left out.
pub fn detect_choice_columns(
    schema: &SurveySchema,
    rows: &[Vec<String>],
    vocabulary: &[String],
) -> Vec<String> {
    if vocabulary.is_empty() {
        return Vec::new();
    }
    schema
        .data_columns()
        .filter(|c| c.kind() == ColumnKind::Plain)
        .filter(|c| {
            let values = crate::classify::distinct_values(rows, c.position);
            !values.is_empty() && values.iter().all(|v| vocabulary.contains(v))
        })
        .map(|c| c.column_name())
        .collect()
}

fn union_query(templates: &ChartTemplates, clauses: &[String]) -> String {
    format!("{} {}", templates.query_preamble, clauses.join(" UNION ALL "))
}

fn chart_id(prefix: &str, idx: usize) -> String {
    format!("{}-{:02}", prefix, idx)
}

/// Builds the charts and the layout of the dashboard of a survey.
///
/// Only the column catalog is used. The charts come in a fixed order:
/// - the aggregate of all the indices (`main_metrics`), if there is any index
/// - one detail chart per index (`m-01`, `m-02`, ...)
/// - one chart per option set (`c-01`, ...)
/// - one chart per choice question (`q-01`, ...)
///
/// The layout packs the detail charts, then the option set charts, then the
/// choice charts. The aggregate chart is expected in the static part of the
/// template layout.
pub fn build_dashboard(
    schema: &SurveySchema,
    templates: &ChartTemplates,
    choice_columns: &[String],
) -> SchemaResult<DashboardSpec> {
    let mut index_groups: Vec<&CompositeGroup> = schema.index_groups().collect();
    index_groups.sort_by_key(|g| g.first_position);
    let mut option_sets: Vec<&CompositeGroup> = schema.option_sets().collect();
    option_sets.sort_by_key(|g| g.first_position);

    let mut charts: Vec<ChartSpec> = Vec::new();

    if !index_groups.is_empty() {
        let clauses: Vec<String> = index_groups
            .iter()
            .map(|g| {
                fill_template(
                    &templates.main_metric_clause,
                    &[
                        ("field_name", quote_identifier(&g.section).as_str()),
                        ("field_label", quote_literal(&g.section).as_str()),
                    ],
                )
            })
            .collect();
        charts.push(ChartSpec {
            id: MAIN_METRICS_CHART.to_string(),
            title: None,
            query: union_query(templates, &clauses),
            display: templates.metrics_chart.clone(),
        });
    }

    let mut detail_ids: Vec<String> = Vec::new();
    for (idx, g) in index_groups.iter().enumerate() {
        let clauses: Vec<String> = g
            .members
            .iter()
            .map(|c| {
                fill_template(
                    &templates.sub_metric_clause,
                    &[
                        ("field_name", quote_identifier(&c.column_name()).as_str()),
                        ("sub_field_name", quote_literal(c.label()).as_str()),
                    ],
                )
            })
            .collect();
        let id = chart_id("m", idx + 1);
        debug!("build_dashboard: {} -> '{}'", id, g.section);
        charts.push(ChartSpec {
            id: id.clone(),
            title: Some(g.section.clone()),
            query: union_query(templates, &clauses),
            display: templates.metrics_chart.clone(),
        });
        detail_ids.push(id);
    }

    let mut option_ids: Vec<String> = Vec::new();
    for (idx, g) in option_sets.iter().enumerate() {
        let clause_template = templates
            .option_clause
            .as_ref()
            .context(MissingTemplateFieldSnafu {
                field: "option_clause_template",
            })?;
        let clauses: Vec<String> = g
            .options()
            .map(|c| {
                fill_template(
                    clause_template,
                    &[
                        ("field_name", quote_identifier(&c.column_name()).as_str()),
                        ("option_name", quote_literal(c.label()).as_str()),
                    ],
                )
            })
            .collect();
        let id = chart_id("c", idx + 1);
        debug!("build_dashboard: {} -> '{}'", id, g.section);
        charts.push(ChartSpec {
            id: id.clone(),
            title: Some(g.section.clone()),
            query: union_query(templates, &clauses),
            display: templates
                .options_chart
                .clone()
                .unwrap_or_else(|| templates.metrics_chart.clone()),
        });
        option_ids.push(id);
    }

    let mut choice_ids: Vec<String> = Vec::new();
    for (idx, column) in choice_columns.iter().enumerate() {
        let clause_template = templates
            .choice_clause
            .as_ref()
            .context(MissingTemplateFieldSnafu {
                field: "choice_clause_template",
            })?;
        let clause = fill_template(
            clause_template,
            &[
                ("field_name", quote_identifier(column).as_str()),
                ("field_label", quote_literal(column).as_str()),
            ],
        );
        let id = chart_id("q", idx + 1);
        charts.push(ChartSpec {
            id: id.clone(),
            title: Some(column.clone()),
            query: union_query(templates, &[clause]),
            display: templates
                .choice_chart
                .clone()
                .unwrap_or_else(|| templates.metrics_chart.clone()),
        });
        choice_ids.push(id);
    }

    let mut layout = layout_rows(&detail_ids);
    layout.extend(layout_rows(&option_ids));
    layout.extend(layout_rows(&choice_ids));

    info!(
        "build_dashboard: {} charts ({} indices, {} option sets, {} choice questions)",
        charts.len(),
        detail_ids.len(),
        option_ids.len(),
        choice_ids.len()
    );
    Ok(DashboardSpec { charts, layout })
}
