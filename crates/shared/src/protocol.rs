use serde::{Deserialize, Serialize};

use crate::domain::Section;

pub const DEFAULT_CHART_TEMPLATE: &str = "plotly_dark";

/// Ordered render tree produced by one render pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Page {
    pub blocks: Vec<Block>,
}

impl Page {
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn charts(&self) -> impl Iterator<Item = (Section, &ChartSpec)> + '_ {
        self.blocks.iter().filter_map(|block| match block {
            Block::Chart { section, chart } => Some((*section, chart)),
            _ => None,
        })
    }

    pub fn chart_for(&self, section: Section) -> Option<&ChartSpec> {
        self.charts()
            .find(|(chart_section, _)| *chart_section == section)
            .map(|(_, chart)| chart)
    }

    pub fn alerts(&self) -> impl Iterator<Item = &Alert> + '_ {
        self.blocks.iter().filter_map(|block| match block {
            Block::Alert { alert, .. } => Some(alert),
            _ => None,
        })
    }

    pub fn alerts_with_level(&self, level: AlertLevel) -> Vec<&Alert> {
        self.alerts().filter(|alert| alert.level == level).collect()
    }

    pub fn alert_for(&self, section: Section) -> Option<&Alert> {
        self.blocks.iter().find_map(|block| match block {
            Block::Alert {
                section: Some(alert_section),
                alert,
            } if *alert_section == section => Some(alert),
            _ => None,
        })
    }

    pub fn preview(&self) -> Option<&TablePreview> {
        self.blocks.iter().find_map(|block| match block {
            Block::Preview(preview) => Some(preview),
            _ => None,
        })
    }

    pub fn has_feedback_form(&self) -> bool {
        self.blocks
            .iter()
            .any(|block| matches!(block, Block::FeedbackForm { .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Block {
    Banner {
        role: BannerRole,
        text: String,
    },
    Text {
        text: String,
    },
    SectionHeader {
        title: String,
    },
    UploadForm {
        label: String,
        accept: String,
    },
    Preview(TablePreview),
    Chart {
        section: Section,
        chart: ChartSpec,
    },
    Alert {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        section: Option<Section>,
        alert: Alert,
    },
    FeedbackForm {
        prompt: String,
        submit_label: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerRole {
    Header,
    Footer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
}

impl Alert {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: AlertLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: AlertLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: AlertLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: AlertLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnHeader {
    pub name: String,
    pub kind: ColumnKind,
}

/// Leading rows of the uploaded dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePreview {
    pub columns: Vec<ColumnHeader>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Pie,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    /// `None` marks a missing value; line charts draw a gap there.
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub template: String,
    pub points: Vec<ChartPoint>,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: impl Into<String>, x_label: &str, y_label: &str) -> Self {
        Self {
            kind,
            title: title.into(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            template: DEFAULT_CHART_TEMPLATE.to_string(),
            points: Vec::new(),
        }
    }

    pub fn with_points(mut self, points: Vec<ChartPoint>) -> Self {
        self.points = points;
        self
    }

    pub fn labels(&self) -> Vec<&str> {
        self.points.iter().map(|point| point.label.as_str()).collect()
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
