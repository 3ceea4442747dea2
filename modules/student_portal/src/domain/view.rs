//! Dashboard presentation model: what the student table and header show.

use crate::contract::model::Student;

pub const UNKNOWN_CAMPUS: &str = "UNKNOWN";
pub const DEFAULT_ROLE: &str = "USER";
pub const SIGNED_IN: &str = "Signed In";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRow {
    pub id_label: String,
    pub name: String,
    pub email: String,
    pub campus: String,
    pub role: String,
}

impl From<&Student> for StudentRow {
    fn from(s: &Student) -> Self {
        Self {
            id_label: id_label(s.id),
            name: s.name.clone(),
            email: s.email.clone(),
            campus: s.campus().unwrap_or(UNKNOWN_CAMPUS).to_string(),
            role: s.role().unwrap_or(DEFAULT_ROLE).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    /// Header name: the first listed student, or a generic label.
    pub display_name: String,
    /// Header role line, with the signed-in email appended when known.
    pub role_line: String,
    pub user_email: Option<String>,
    pub total_students: usize,
    pub rows: Vec<StudentRow>,
}

impl DashboardView {
    pub fn new(students: &[Student], user_email: Option<&str>) -> Self {
        let first = students.first();
        let display_name = first
            .map(|s| s.name.trim())
            .filter(|n| !n.is_empty())
            .unwrap_or(SIGNED_IN)
            .to_string();
        let role = first.and_then(Student::role).unwrap_or(DEFAULT_ROLE);
        let role_line = match user_email {
            Some(email) => format!("{} • {}", role, email),
            None => role.to_string(),
        };

        Self {
            display_name,
            role_line,
            user_email: user_email.map(str::to_string),
            total_students: students.len(),
            rows: students.iter().map(StudentRow::from).collect(),
        }
    }
}

/// `#` followed by the id left-padded with zeros to three digits.
pub fn id_label(id: i64) -> String {
    format!("#{:03}", id)
}
