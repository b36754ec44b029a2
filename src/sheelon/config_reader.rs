use std::fs;

use serde::{Deserialize, Serialize};
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;

use crate::sheelon::*;

/// The template of the metadata file ("meta-metadata").
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct MetaMetadata {
    /// Copied as is at the top of the metadata file.
    pub preamble: JSMap<String, JSValue>,
    pub dashboard: MetaDashboard,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct MetaDashboard {
    pub name: String,
    /// The dashboard, before adding the generated charts and layout rows.
    #[serde(rename = "static")]
    pub static_part: JSMap<String, JSValue>,
    pub generate: DashboardGenerate,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DashboardGenerate {
    pub query: QueryTemplates,
    pub metrics: ChartSkeleton,
    pub options: Option<ChartSkeleton>,
    pub choices: Option<ChoiceSkeleton>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct QueryTemplates {
    pub preamble: String,
    pub main_metric_clause_template: String,
    pub sub_metric_clause_template: String,
    pub option_clause_template: Option<String>,
    pub choice_clause_template: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ChartSkeleton {
    #[serde(rename = "static")]
    pub static_part: JSMap<String, JSValue>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceSkeleton {
    /// The answers of the questions that get a chart of their own.
    pub vocabulary: Vec<String>,
    #[serde(rename = "static")]
    pub static_part: Option<JSMap<String, JSValue>>,
}

/// Reads the template used to make the metadata file `target`.
pub fn read_meta_metadata(path: &str, target: &str) -> SheelonResult<MetaMetadata> {
    let contents = fs::read_to_string(path).context(OpeningTemplateSnafu { path, target })?;
    debug!("read_meta_metadata: read {} bytes from {:?}", contents.len(), path);
    serde_yaml::from_str(&contents).context(ParsingTemplateSnafu { path })
}

pub fn chart_templates(meta: &MetaMetadata) -> ChartTemplates {
    let gen = &meta.dashboard.generate;
    ChartTemplates {
        query_preamble: gen.query.preamble.clone(),
        main_metric_clause: gen.query.main_metric_clause_template.clone(),
        sub_metric_clause: gen.query.sub_metric_clause_template.clone(),
        option_clause: gen.query.option_clause_template.clone(),
        choice_clause: gen.query.choice_clause_template.clone(),
        metrics_chart: gen.metrics.static_part.clone(),
        options_chart: gen.options.as_ref().map(|o| o.static_part.clone()),
        choice_chart: gen.choices.as_ref().and_then(|c| c.static_part.clone()),
        choice_vocabulary: gen
            .choices
            .as_ref()
            .map(|c| c.vocabulary.clone())
            .unwrap_or_default(),
    }
}
