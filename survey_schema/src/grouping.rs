use log::debug;
use snafu::ensure;
use std::collections::HashSet;

use crate::config::*;

/// Gathers the runs of consecutive composite columns that share a section
/// title into groups, and checks that the members of each group have types
/// consistent with the role of the group.
///
/// A run ends at the first column with another section title, or at the first
/// column that is not composite.
pub fn group_columns(columns: &[ColumnDescriptor]) -> SchemaResult<Vec<CompositeGroup>> {
    let mut runs: Vec<(String, Vec<ColumnDescriptor>)> = Vec::new();
    let mut current: Option<(String, Vec<ColumnDescriptor>)> = None;
    for col in columns.iter() {
        match (col.section(), current.as_mut()) {
            (Some(section), Some((cur_section, members))) if section == cur_section.as_str() => {
                members.push(col.clone());
                continue;
            }
            _ => {}
        }
        runs.extend(current.take());
        if let Some(section) = col.section() {
            current = Some((section.to_string(), vec![col.clone()]));
        }
    }
    runs.extend(current.take());

    let mut groups: Vec<CompositeGroup> = Vec::with_capacity(runs.len());
    for (section, members) in runs {
        let group = close_group(section, members)?;
        debug!(
            "group_columns: '{}' ({:?}): {:?}",
            group.section,
            group.role,
            group.member_names()
        );
        groups.push(group);
    }
    check_aggregate_names(columns, &groups)?;
    Ok(groups)
}

fn close_group(section: String, members: Vec<ColumnDescriptor>) -> SchemaResult<CompositeGroup> {
    let role = if section.contains(PICK_MARKER) {
        GroupRole::OptionSet
    } else if members
        .iter()
        .any(|c| c.question_type.map(|qt| qt.is_ordinal()).unwrap_or(false))
    {
        GroupRole::Index
    } else {
        GroupRole::Section
    };

    for member in members.iter() {
        let qt = member.question_type;
        let valid = match role {
            GroupRole::Index => qt.map(|t| t.is_scored()).unwrap_or(false),
            GroupRole::OptionSet => match qt {
                Some(QuestionType::Choice) => true,
                Some(QuestionType::Text) => member.label().contains(OTHER_MARKER),
                _ => false,
            },
            GroupRole::Section => true,
        };
        ensure!(
            valid,
            InconsistentGroupSnafu {
                group: section.clone(),
                member: member.label().to_string(),
                found: qt.map(|t| t.code()).unwrap_or("none"),
                expected: match role {
                    GroupRole::OptionSet => "'choice', or 'text' for the 'other' option",
                    _ => "an ordinal scale ('asc5' or 'desc5')",
                },
            }
        );
    }

    let first_position = members.first().map(|c| c.position).unwrap_or(0);
    Ok(CompositeGroup {
        section,
        role,
        first_position,
        members,
    })
}

// The aggregate of an index is stored under the section title: it must not
// clash with another column or another index. Table column names ignore case.
fn check_aggregate_names(columns: &[ColumnDescriptor], groups: &[CompositeGroup]) -> SchemaResult<()> {
    let mut taken: HashSet<String> = columns
        .iter()
        .filter(|c| c.kind() != ColumnKind::Technical)
        .map(|c| c.column_name().to_lowercase())
        .collect();
    taken.insert(ROW_NUMBER_COLUMN.to_string());
    for g in groups.iter().filter(|g| g.role == GroupRole::Index) {
        let name = g.section.to_lowercase();
        ensure!(
            !taken.contains(&name),
            DuplicateQuestionSnafu {
                section: UNSECTIONED,
                name: g.section.clone(),
                column: g.first_position + 1,
            }
        );
        taken.insert(name);
    }
    Ok(())
}
