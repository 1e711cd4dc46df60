//! Course document ingestion.
//!
//! A course file starts with header lines
//!
//! ```text
//! Course Title: MCP: Build Rich-Context AI Apps with Anthropic
//! Course Link: https://example.com/mcp
//! Course Instructor: Elie Schoppik
//! ```
//!
//! followed by lessons introduced by `Lesson <n>: <title>` markers, each
//! optionally followed by a `Lesson Link: <url>` line.

mod chunker;

pub use chunker::SentenceChunker;

use crate::config::IngestSettings;
use crate::error::{CoursemateError, Result};
use crate::models::{Course, CourseChunk, Lesson};
use regex::Regex;
use std::path::Path;
use tracing::{debug, instrument};

/// Text belonging to one lesson, or to the course body when it has none.
#[derive(Debug, Clone, PartialEq)]
struct Section {
    lesson_number: Option<i64>,
    text: String,
}

/// Parses course files and cuts them into searchable chunks.
#[derive(Debug, Clone)]
pub struct DocumentProcessor {
    chunker: SentenceChunker,
    lesson_marker: Regex,
    header: Regex,
}

impl DocumentProcessor {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let lesson_marker = Regex::new(r"(?i)^lesson\s+(\d+)\s*:\s*(.*)$").expect("Invalid regex");
        let header =
            Regex::new(r"(?i)^(course title|course link|course instructor|lesson link)\s*:\s*(.*)$")
                .expect("Invalid regex");

        Self {
            chunker: SentenceChunker::new(chunk_size, chunk_overlap),
            lesson_marker,
            header,
        }
    }

    pub fn from_settings(settings: &IngestSettings) -> Self {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    /// Read and process one course file. The file stem is the fallback title.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn process_file(&self, path: &Path) -> Result<(Course, Vec<CourseChunk>)> {
        let text = std::fs::read_to_string(path)?;
        let fallback = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                CoursemateError::Ingest(format!("Invalid file name: {}", path.display()))
            })?;

        let (course, chunks) = self.process_text(&text, fallback)?;
        debug!(
            "Parsed '{}': {} lessons, {} chunks",
            course.title,
            course.lessons.len(),
            chunks.len()
        );
        Ok((course, chunks))
    }

    /// Parse a course document and chunk its lessons.
    pub fn process_text(&self, text: &str, fallback_title: &str) -> Result<(Course, Vec<CourseChunk>)> {
        let (course, sections) = self.parse(text, fallback_title);
        if course.title.trim().is_empty() {
            return Err(CoursemateError::Ingest("Course has no title".to_string()));
        }

        let mut chunks = Vec::new();
        for section in sections {
            for (i, piece) in self.chunker.chunk(&section.text).into_iter().enumerate() {
                let content = match (i, section.lesson_number) {
                    (0, Some(n)) => format!("Lesson {} content: {}", n, piece),
                    _ => piece,
                };
                chunks.push(CourseChunk {
                    content,
                    course_title: course.title.clone(),
                    lesson_number: section.lesson_number,
                    chunk_index: chunks.len(),
                });
            }
        }

        Ok((course, chunks))
    }

    fn parse(&self, text: &str, fallback_title: &str) -> (Course, Vec<Section>) {
        let mut course = Course::new(fallback_title);
        let mut sections: Vec<Section> = Vec::new();
        let mut body = Section {
            lesson_number: None,
            text: String::new(),
        };
        let mut in_lessons = false;

        for line in text.lines() {
            let trimmed = line.trim();

            if let Some(caps) = self.lesson_marker.captures(trimmed) {
                // Too many digits to be a lesson number
                let Ok(number) = caps[1].parse::<i64>() else {
                    append_line(&mut current_section(&mut sections, &mut body, in_lessons).text, trimmed);
                    continue;
                };
                in_lessons = true;
                course.lessons.push(Lesson::new(number, caps[2].trim(), None));
                sections.push(Section {
                    lesson_number: Some(number),
                    text: String::new(),
                });
                continue;
            }

            if let Some(caps) = self.header.captures(trimmed) {
                let value = caps[2].trim().to_string();
                let value = (!value.is_empty()).then_some(value);
                match caps[1].to_lowercase().as_str() {
                    "lesson link" if in_lessons => {
                        if let Some(lesson) = course.lessons.last_mut() {
                            lesson.lesson_link = value;
                        }
                        continue;
                    }
                    "course title" if !in_lessons => {
                        if let Some(title) = value {
                            course.title = title;
                        }
                        continue;
                    }
                    "course link" if !in_lessons => {
                        course.course_link = value;
                        continue;
                    }
                    "course instructor" if !in_lessons => {
                        course.instructor = value;
                        continue;
                    }
                    _ => {}
                }
            }

            append_line(&mut current_section(&mut sections, &mut body, in_lessons).text, trimmed);
        }

        if !in_lessons {
            sections.push(body);
        }
        sections.retain(|s| !s.text.trim().is_empty());
        (course, sections)
    }
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new(800, 100)
    }
}

fn current_section<'a>(
    sections: &'a mut [Section],
    body: &'a mut Section,
    in_lessons: bool,
) -> &'a mut Section {
    match sections.last_mut() {
        Some(section) if in_lessons => section,
        _ => body,
    }
}

fn append_line(text: &mut String, line: &str) {
    if line.is_empty() {
        return;
    }
    if !text.is_empty() {
        text.push(' ');
    }
    text.push_str(line);
}

/// Whether a path looks like a course document.
pub fn is_course_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("txt"))
}
