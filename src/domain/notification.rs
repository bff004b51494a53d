//! Task notification messages and their HTML rendering.

use serde::Serialize;

/// Name + contact person pair shown in "updated" mails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSnapshot {
    pub name: String,
    pub contact_person: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedTask {
    pub name: String,
    pub project: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Notification {
    Assigned {
        task_name: String,
        contact_person: Option<String>,
    },
    Updated {
        previous: TaskSnapshot,
        updated: TaskSnapshot,
    },
    Upload {
        tasks: Vec<UploadedTask>,
    },
}

const SIGNATURE: &str = "<p>Best regards,<br>Project Management Team</p>";

impl Notification {
    pub fn subject(&self) -> String {
        match self {
            Notification::Assigned { task_name, .. } => {
                format!("New Task Assigned: {}", or_default(task_name, "Untitled Task"))
            }
            Notification::Updated { updated, .. } => {
                format!("Task Updated: {}", or_default(&updated.name, "N/A"))
            }
            Notification::Upload { .. } => "New Tasks Uploaded".to_string(),
        }
    }

    pub fn html_body(&self) -> String {
        match self {
            Notification::Assigned {
                task_name,
                contact_person,
            } => format!(
                "<h3>You have been assigned a new task</h3>\
                 <p><strong>Task:</strong> {}</p>\
                 <p><strong>Contact Person:</strong> {}</p>\
                 <p>Please log in to the system to view more details regarding the task.</p>{}",
                escape(or_default(task_name, "N/A")),
                escape(contact_person.as_deref().unwrap_or("N/A")),
                SIGNATURE
            ),
            Notification::Updated { previous, updated } => format!(
                "<h3>The task \"{}\" has been updated</h3>\
                 <p><strong>Previous Details:</strong><br>Name: {}<br>Contact Person: {}</p>\
                 <p><strong>Updated Details:</strong><br>Name: {}<br>Contact Person: {}</p>\
                 <p>Please check the task management system for more details.</p>{}",
                escape(or_default(&updated.name, "N/A")),
                escape(or_default(&previous.name, "N/A")),
                escape(previous.contact_person.as_deref().unwrap_or("N/A")),
                escape(or_default(&updated.name, "N/A")),
                escape(updated.contact_person.as_deref().unwrap_or("N/A")),
                SIGNATURE
            ),
            Notification::Upload { tasks } => {
                let items = if tasks.is_empty() {
                    "<li>No tasks found</li>".to_string()
                } else {
                    tasks
                        .iter()
                        .map(|t| {
                            format!(
                                "<li><strong>{}</strong> (Project: {})</li>",
                                escape(&t.name),
                                escape(t.project.as_deref().unwrap_or("N/A"))
                            )
                        })
                        .collect()
                };
                format!(
                    "<h3>New Tasks Have Been Uploaded</h3>\
                     <p>You have been assigned new tasks. Please see the list below:</p>\
                     <ul>{}</ul>\
                     <p>Please check the task management system for full details.</p>{}",
                    items, SIGNATURE
                )
            }
        }
    }
}

fn or_default<'a>(s: &'a str, fallback: &'a str) -> &'a str {
    if s.trim().is_empty() { fallback } else { s }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assigned_subject_falls_back() {
        let n = Notification::Assigned {
            task_name: "  ".into(),
            contact_person: None,
        };
        assert_eq!(n.subject(), "New Task Assigned: Untitled Task");
        assert!(n.html_body().contains("<strong>Contact Person:</strong> N/A"));
    }

    #[test]
    fn test_updated_body_shows_both_versions() {
        let n = Notification::Updated {
            previous: TaskSnapshot {
                name: "Old".into(),
                contact_person: Some("Ann".into()),
            },
            updated: TaskSnapshot {
                name: "New".into(),
                contact_person: Some("Bob".into()),
            },
        };
        assert_eq!(n.subject(), "Task Updated: New");
        let body = n.html_body();
        assert!(body.contains("Name: Old<br>Contact Person: Ann"));
        assert!(body.contains("Name: New<br>Contact Person: Bob"));
    }

    #[test]
    fn test_upload_lists_tasks_escaped() {
        let n = Notification::Upload {
            tasks: vec![UploadedTask {
                name: "<script>".into(),
                project: None,
            }],
        };
        let body = n.html_body();
        assert!(body.contains("<li><strong>&lt;script&gt;</strong> (Project: N/A)</li>"));

        let empty = Notification::Upload { tasks: vec![] };
        assert!(empty.html_body().contains("<li>No tasks found</li>"));
    }
}
