//! Output formatting for the task list.

use crate::types::{FilterPreferences, SortOrder, Task};
use serde_json::{Value, json};

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// One line per task: `[x] ! name  #id`.
pub fn format_task_line(task: &Task) -> String {
    let check = if task.completed { "[x]" } else { "[ ]" };
    let flag = if task.important { "!" } else { " " };
    format!("{} {} {}  #{}", check, flag, task.name, task.id)
}

/// Human readable listing with a header describing the active filters.
pub fn format_tasks_text(tasks: &[Task], search: &str, prefs: &FilterPreferences) -> String {
    let mut out = String::new();

    let sort = match prefs.sort_order {
        SortOrder::ByName => "name",
        SortOrder::ByDate => "date created",
    };
    out.push_str(&format!("Tasks ({}) sorted by {}", tasks.len(), sort));
    if prefs.hide_completed {
        out.push_str(", completed hidden");
    }
    if !search.is_empty() {
        out.push_str(&format!(", matching \"{}\"", search));
    }
    out.push('\n');

    if tasks.is_empty() {
        out.push_str("  (no tasks)\n");
        return out;
    }

    for task in tasks {
        out.push_str(&format_task_line(task));
        out.push('\n');
    }
    out
}

/// JSON document with the filters and the visible tasks.
pub fn format_tasks_json(tasks: &[Task], search: &str, prefs: &FilterPreferences) -> Value {
    json!({
        "search": search,
        "sort_order": prefs.sort_order.as_str(),
        "hide_completed": prefs.hide_completed,
        "tasks": tasks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: i64, name: &str, important: bool, completed: bool) -> Task {
        Task {
            id,
            name: name.to_string(),
            important,
            completed,
            created: 0,
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("text"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_str("xml"), None);
    }

    #[test]
    fn test_task_line_markers() {
        assert_eq!(format_task_line(&task(3, "Pay rent", true, false)), "[ ] ! Pay rent  #3");
        assert_eq!(format_task_line(&task(4, "Laundry", false, true)), "[x]   Laundry  #4");
    }

    #[test]
    fn test_text_header_mentions_filters() {
        let prefs = FilterPreferences::new(SortOrder::ByName, true);
        let text = format_tasks_text(&[], "milk", &prefs);
        assert!(text.starts_with("Tasks (0) sorted by name, completed hidden, matching \"milk\""));
        assert!(text.contains("(no tasks)"));
    }

    #[test]
    fn test_json_listing() {
        let prefs = FilterPreferences::default();
        let value = format_tasks_json(&[task(1, "A", false, false)], "", &prefs);
        assert_eq!(value["sort_order"], "by_date");
        assert_eq!(value["hide_completed"], false);
        assert_eq!(value["tasks"][0]["name"], "A");
    }
}
