//! Distinct-value suggestion queries
//!
//! While the user types into a filter value control, the editor fetches
//! candidate values by querying the column itself.

/// Build the query that lists candidate values for a filter control
///
/// Returns `None` when no table or column is selected yet. The result cap
/// is one above the editor's page size so the control can tell "more
/// available" apart from a full last page.
pub fn suggestion_query(table: &str, field: &str, typed: Option<&str>) -> Option<String> {
    if table.is_empty() || field.is_empty() {
        return None;
    }

    let mut stages = vec![table.to_string()];
    if let Some(text) = typed.filter(|text| !text.is_empty()) {
        stages.push(format!(
            "| where {} contains '{}'",
            field,
            text.replace('\'', "''")
        ));
    }
    stages.push(format!("| distinct {}", field));
    stages.push(format!("| order by {} asc", field));
    stages.push("| take 251".to_string());

    Some(stages.join("\n"))
}
