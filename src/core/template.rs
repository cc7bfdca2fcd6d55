use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::block::{BACKGROUND_COLOR_KEY, PAGE_TYPE_KEY, Properties};
use super::week::format_date;

/// Marker every generated day heading starts with.
pub const HEADING_MARKER: &str = "###";

/// Lines of a master template containing this word are authoring notes.
pub const TEMPLATE_LINE_WORD: &str = "template";

/// One heading of the weekly page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayDescriptor {
    pub name: String,
    /// Background colour tag; empty means no colour property.
    #[serde(default)]
    pub color: String,
    pub is_day: bool,
    /// Day of week, 0 = Sunday. Only set for day headings.
    #[serde(default)]
    pub day: Option<u32>,
}

impl DayDescriptor {
    fn day(name: &str, color: &str, day: u32) -> Self {
        Self {
            name: name.to_string(),
            color: color.to_string(),
            is_day: true,
            day: Some(day),
        }
    }

    /// Heading text: `### **[[Sat, 13.01.2024]]**`, or `### **[[Good News]]**`
    /// for entries without a date.
    pub fn heading(&self, date: Option<NaiveDate>) -> String {
        match date {
            Some(date) if self.is_day => {
                format!("{} **[[{}, {}]]**", HEADING_MARKER, self.name, format_date(date))
            }
            _ => format!("{} **[[{}]]**", HEADING_MARKER, self.name),
        }
    }

    pub fn properties(&self) -> Properties {
        if self.color.is_empty() {
            Vec::new()
        } else {
            vec![(BACKGROUND_COLOR_KEY.to_string(), self.color.clone())]
        }
    }
}

/// Layout of a freshly templated news page.
///
/// `days` is both the creation order of the headings and the order in which
/// the synchronizer assigns dates, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub properties: Properties,
    pub days: Vec<DayDescriptor>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            properties: vec![
                (PAGE_TYPE_KEY.to_string(), "news".to_string()),
                ("author".to_string(), String::new()),
                ("topics".to_string(), String::new()),
            ],
            days: vec![
                DayDescriptor {
                    name: "Good News".to_string(),
                    color: "green".to_string(),
                    is_day: false,
                    day: None,
                },
                DayDescriptor::day("Sat", "yellow", 6),
                DayDescriptor::day("Fri", "red", 5),
                DayDescriptor::day("Thu", "pink", 4),
                DayDescriptor::day("Wed", "blue", 3),
                DayDescriptor::day("Tue", "purple", 2),
                DayDescriptor::day("Mon", "gray", 1),
                DayDescriptor::day("Sun", "", 0),
            ],
        }
    }
}

impl TemplateConfig {
    /// Text identifying the block that never receives a date.
    pub fn undated_marker(&self) -> &str {
        self.days
            .iter()
            .find(|d| !d.is_day)
            .map(|d| d.name.as_str())
            .unwrap_or("Good News")
    }
}

/// Drop every line mentioning the template word, case-insensitively.
pub fn strip_template_lines(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.to_lowercase().contains(TEMPLATE_LINE_WORD))
        .collect::<Vec<_>>()
        .join("\n")
}
