//! Course domain types produced by ingestion and stored in the catalog.

use serde::{Deserialize, Serialize};

/// One lesson of a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub lesson_number: i64,
    #[serde(rename = "lesson_title", default = "untitled")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_link: Option<String>,
}

fn untitled() -> String {
    "Untitled".to_string()
}

impl Lesson {
    pub fn new(lesson_number: i64, title: impl Into<String>, lesson_link: Option<String>) -> Self {
        Self {
            lesson_number,
            title: title.into(),
            lesson_link,
        }
    }
}

/// A course and its lesson list. The title is the course's identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    pub course_link: Option<String>,
    pub instructor: Option<String>,
    pub lessons: Vec<Lesson>,
}

impl Course {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            course_link: None,
            instructor: None,
            lessons: Vec::new(),
        }
    }

    /// Serialize the lesson list into the form persisted in the catalog.
    pub fn lessons_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(&self.lessons)?)
    }
}

/// A searchable slice of one course's transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseChunk {
    pub content: String,
    pub course_title: String,
    pub lesson_number: Option<i64>,
    pub chunk_index: usize,
}

/// Parse a persisted lesson list. Missing titles default to "Untitled".
pub fn parse_lessons_json(json: &str) -> crate::error::Result<Vec<Lesson>> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lessons_json_uses_catalog_field_names() {
        let mut course = Course::new("MCP");
        course.lessons.push(Lesson::new(0, "Introduction", None));
        course
            .lessons
            .push(Lesson::new(1, "Why MCP", Some("https://example.com/lesson1".to_string())));

        let json = course.lessons_json().unwrap();
        assert!(json.contains("\"lesson_title\":\"Introduction\""));
        assert!(!json.contains("\"lesson_link\":null"));

        let parsed = parse_lessons_json(&json).unwrap();
        assert_eq!(parsed, course.lessons);
    }

    #[test]
    fn test_parse_lessons_defaults_missing_title() {
        let lessons = parse_lessons_json(r#"[{"lesson_number": 3}]"#).unwrap();
        assert_eq!(lessons[0].title, "Untitled");
        assert_eq!(lessons[0].lesson_link, None);
    }

    #[test]
    fn test_parse_lessons_rejects_malformed() {
        assert!(parse_lessons_json("not json").is_err());
    }
}
