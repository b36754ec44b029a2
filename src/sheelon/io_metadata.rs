// Assembling, writing and checking the metadata file.

use std::fs;

use serde_json::{json, Map as JSMap, Value as JSValue};
use text_diff::print_diff;

use crate::sheelon::config_reader::MetaMetadata;
use crate::sheelon::*;

const PLUGINS: &str = "plugins";
const DASHBOARDS_PLUGIN: &str = "datasette-dashboards";

/// Builds the metadata document: the preamble of the template, with the
/// dashboard placed under its name in the dashboards plugin.
pub fn assemble_metadata(meta: &MetaMetadata, dashboard: &DashboardSpec) -> SheelonResult<JSValue> {
    let mut dash = meta.dashboard.static_part.clone();

    let charts = dash
        .entry("charts")
        .or_insert_with(|| JSValue::Object(Default::default()));
    let charts = match charts {
        JSValue::Object(m) => m,
        x => whatever!("The charts of the dashboard template must be a mapping, found {}", x),
    };
    for chart in dashboard.charts.iter() {
        if charts.contains_key(&chart.id) {
            warn!("assemble_metadata: replacing chart {:?} of the template", chart.id);
        }
        charts.insert(chart.id.clone(), chart.to_json());
    }

    let layout = dash
        .entry("layout")
        .or_insert_with(|| JSValue::Array(Vec::new()));
    let layout = match layout {
        JSValue::Array(v) => v,
        x => whatever!("The layout of the dashboard template must be a list, found {}", x),
    };
    layout.extend(dashboard.layout.iter().map(|[a, b]| json!([a, b])));

    let mut preamble = meta.preamble.clone();
    let plugins = preamble
        .entry(PLUGINS)
        .or_insert_with(|| JSValue::Object(Default::default()));
    match plugins {
        JSValue::Object(m) => {
            let mut named = JSMap::new();
            named.insert(meta.dashboard.name.clone(), JSValue::Object(dash));
            m.insert(DASHBOARDS_PLUGIN.to_string(), JSValue::Object(named));
        }
        x => whatever!("The plugins of the template preamble must be a mapping, found {}", x),
    }
    Ok(JSValue::Object(preamble))
}

pub fn write_metadata(path: &str, yaml: &str) -> SheelonResult<()> {
    fs::write(path, yaml).context(WritingOutputSnafu { path })
}

/// Compares the generated metadata with a reference file, and prints the
/// differences if any.
pub fn check_reference(path: &str, yaml: &str) -> SheelonResult<()> {
    let reference = fs::read_to_string(path).context(OpeningReferenceSnafu { path })?;
    if reference != yaml {
        warn!("Found differences with the reference metadata");
        print_diff(reference.as_str(), yaml, "\n");
        whatever!("Difference detected between the generated metadata and {:?}", path)
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> MetaMetadata {
        serde_yaml::from_str(
            r#"
preamble:
  title: Results
dashboard:
  name: survey
  static:
    title: Survey
    layout: [[intro, intro]]
    charts:
      intro:
        library: markdown
  generate:
    query:
      preamble: ""
      main_metric_clause_template: ""
      sub_metric_clause_template: ""
    metrics:
      static: {}
"#,
        )
        .unwrap()
    }

    fn dashboard() -> DashboardSpec {
        DashboardSpec {
            charts: vec![ChartSpec {
                id: "m-01".to_string(),
                title: Some("Trust".to_string()),
                query: "SELECT 1".to_string(),
                display: Default::default(),
            }],
            layout: vec![["m-01".to_string(), ".".to_string()]],
        }
    }

    #[test]
    fn place_dashboard() {
        let res = assemble_metadata(&template(), &dashboard()).unwrap();
        assert_eq!(res["title"], json!("Results"));
        let dash = &res[PLUGINS][DASHBOARDS_PLUGIN]["survey"];
        assert_eq!(dash["title"], json!("Survey"));
        assert_eq!(dash["layout"], json!([["intro", "intro"], ["m-01", "."]]));
        let ids: Vec<&String> = dash["charts"].as_object().unwrap().keys().collect();
        assert_eq!(ids, vec!["intro", "m-01"]);
        assert_eq!(
            dash["charts"]["m-01"],
            json!({"title": "Trust", "query": "SELECT 1"})
        );
    }

    #[test]
    fn bad_layout() {
        let mut meta = template();
        meta.dashboard
            .static_part
            .insert("layout".to_string(), json!("wide"));
        let res = assemble_metadata(&meta, &dashboard());
        assert!(matches!(res, Err(SheelonError::Whatever { .. })));
    }

    #[test]
    fn reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.yml").display().to_string();
        write_metadata(&path, "a: 1\n").unwrap();
        assert!(check_reference(&path, "a: 1\n").is_ok());
        assert!(matches!(
            check_reference(&path, "a: 2\n"),
            Err(SheelonError::Whatever { .. })
        ));
        assert!(matches!(
            check_reference("/nonexistent/ref.yml", "a: 1\n"),
            Err(SheelonError::OpeningReference { .. })
        ));
    }
}
