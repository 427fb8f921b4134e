use shared::{
    domain::{Interaction, Section},
    protocol::{
        Alert, BannerRole, Block, ChartKind, ChartPoint, ChartSpec, ColumnHeader, Page,
        TablePreview,
    },
};
use tracing::debug;

use crate::{
    aggregate::{sales_series, sum_by_group, top_n_by_sum, SalesOrdering},
    dataset::{Dataset, DatasetError},
    schema::{
        validate, ColumnRequirement, ValidationOutcome, PRODUCT, PRODUCT_REQUIREMENT, REGION,
        REGION_REQUIREMENT, SALES_AMOUNT, SALES_DATE, SALES_REQUIREMENT,
    },
};

pub const HEADER_TEXT: &str = "🌟 Business Dashboard 🌟";
pub const INTRO_TEXT: &str = "This colorful dashboard provides insights into sales, customer demographics, and product performance. Upload your data to get started.";
pub const UPLOAD_TITLE: &str = "Upload Business Data";
pub const UPLOAD_LABEL: &str = "📁 Choose a CSV File";
pub const FEEDBACK_PROMPT: &str = "Please provide any feedback or suggestions.";
pub const FEEDBACK_SUBMIT_LABEL: &str = "Submit Feedback";
pub const FEEDBACK_ACK: &str = "✅ Thank you for your feedback.";
pub const FOOTER_TEXT: &str = "This business dashboard template is flexible. Expand upon it based on your specific business needs.";

pub const SALES_CHART_TITLE: &str = "Sales Over Time";
pub const REGION_CHART_TITLE: &str = "Customer Segmentation by Region";
pub const PRODUCT_CHART_TITLE: &str = "Top Products By Sales";

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub preview_rows: usize,
    pub top_products: usize,
    pub sales_ordering: SalesOrdering,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            top_products: 10,
            sales_ordering: SalesOrdering::RowOrder,
        }
    }
}

/// Why a chart section produced no chart.
#[derive(Debug)]
enum SectionFailure {
    Missing {
        requirement: ColumnRequirement,
        missing: Vec<&'static str>,
    },
    Aggregation(DatasetError),
}

impl From<DatasetError> for SectionFailure {
    fn from(value: DatasetError) -> Self {
        SectionFailure::Aggregation(value)
    }
}

impl SectionFailure {
    fn alert(&self) -> Alert {
        match self {
            SectionFailure::Missing { requirement, .. } => {
                Alert::warning(requirement.warning_message())
            }
            SectionFailure::Aggregation(err) => {
                Alert::error(format!("❌ Could not build this chart: {err}."))
            }
        }
    }
}

/// Builds the full page for one request. `dataset` is the session's current
/// upload, if any.
pub fn render_page(
    dataset: Option<&Dataset>,
    interaction: &Interaction,
    options: &RenderOptions,
) -> Page {
    let mut page = page_header();
    match dataset {
        Some(dataset) => push_insights(&mut page, dataset, interaction, options),
        None => {
            if interaction.feedback_submitted() {
                push_feedback_ack(&mut page);
            }
        }
    }
    push_footer(&mut page);
    page
}

/// Page for an upload that could not be read as a table.
pub fn render_load_error(error: &dyn std::error::Error, interaction: &Interaction) -> Page {
    let mut page = page_header();
    page.push(Block::Alert {
        section: None,
        alert: Alert::error(format!("❌ Could not read the uploaded file: {error}.")),
    });
    if interaction.feedback_submitted() {
        push_feedback_ack(&mut page);
    }
    push_footer(&mut page);
    page
}

fn page_header() -> Page {
    let mut page = Page::default();
    page.push(Block::Banner {
        role: BannerRole::Header,
        text: HEADER_TEXT.to_string(),
    });
    page.push(Block::Text {
        text: INTRO_TEXT.to_string(),
    });
    page.push(Block::SectionHeader {
        title: UPLOAD_TITLE.to_string(),
    });
    page.push(Block::UploadForm {
        label: UPLOAD_LABEL.to_string(),
        accept: ".csv".to_string(),
    });
    page
}

fn push_footer(page: &mut Page) {
    page.push(Block::Banner {
        role: BannerRole::Footer,
        text: FOOTER_TEXT.to_string(),
    });
}

fn push_insights(
    page: &mut Page,
    dataset: &Dataset,
    interaction: &Interaction,
    options: &RenderOptions,
) {
    page.push(Block::Preview(preview(dataset, options.preview_rows)));

    push_chart_section(page, Section::Sales, sales_chart(dataset, options));
    push_chart_section(page, Section::Region, region_chart(dataset));
    push_chart_section(page, Section::Product, product_chart(dataset, options));

    page.push(Block::SectionHeader {
        title: Section::Feedback.title().to_string(),
    });
    page.push(Block::FeedbackForm {
        prompt: FEEDBACK_PROMPT.to_string(),
        submit_label: FEEDBACK_SUBMIT_LABEL.to_string(),
    });
    if interaction.feedback_submitted() {
        push_feedback_ack(page);
    }
}

fn push_feedback_ack(page: &mut Page) {
    page.push(Block::Alert {
        section: Some(Section::Feedback),
        alert: Alert::success(FEEDBACK_ACK),
    });
}

fn push_chart_section(page: &mut Page, section: Section, chart: Result<ChartSpec, SectionFailure>) {
    page.push(Block::SectionHeader {
        title: section.title().to_string(),
    });
    match chart {
        Ok(chart) => {
            debug!(?section, points = chart.points.len(), "chart requested");
            if section == Section::Sales {
                page.push(Block::Text {
                    text: SALES_CHART_TITLE.to_string(),
                });
            }
            let empty = chart.points.is_empty();
            page.push(Block::Chart { section, chart });
            if let Some(note) = empty_chart_note(section).filter(|_| empty) {
                page.push(Block::Alert {
                    section: Some(section),
                    alert: Alert::info(note),
                });
            }
        }
        Err(failure) => {
            if let SectionFailure::Missing { missing, .. } = &failure {
                debug!(?section, ?missing, "section skipped: missing columns");
            } else {
                debug!(?section, ?failure, "section skipped");
            }
            page.push(Block::Alert {
                section: Some(section),
                alert: failure.alert(),
            });
        }
    }
}

/// Shown next to a chart whose columns exist but which has nothing to draw.
fn empty_chart_note(section: Section) -> Option<&'static str> {
    match section {
        Section::Sales => Some("No dated sales rows to plot."),
        Section::Region => Some("No region has positive sales to segment."),
        Section::Product => Some("No products to rank."),
        Section::Feedback => None,
    }
}

fn require(dataset: &Dataset, requirement: ColumnRequirement) -> Result<(), SectionFailure> {
    match validate(dataset, &requirement) {
        ValidationOutcome::Satisfied(_) => Ok(()),
        ValidationOutcome::MissingColumns(missing) => Err(SectionFailure::Missing {
            requirement,
            missing,
        }),
    }
}

pub fn preview(dataset: &Dataset, rows: usize) -> TablePreview {
    TablePreview {
        columns: dataset
            .column_names()
            .iter()
            .enumerate()
            .map(|(index, name)| ColumnHeader {
                name: name.clone(),
                kind: dataset.column_kind(index),
            })
            .collect(),
        rows: dataset.head(rows).to_vec(),
        total_rows: dataset.row_count(),
    }
}

fn sales_chart(dataset: &Dataset, options: &RenderOptions) -> Result<ChartSpec, SectionFailure> {
    require(dataset, SALES_REQUIREMENT)?;
    let points = sales_series(dataset, SALES_DATE, SALES_AMOUNT, options.sales_ordering)?;
    Ok(
        ChartSpec::new(ChartKind::Line, SALES_CHART_TITLE, SALES_DATE, SALES_AMOUNT).with_points(
            points
                .into_iter()
                .map(|point| ChartPoint {
                    label: point.date,
                    value: point.amount,
                })
                .collect(),
        ),
    )
}

fn region_chart(dataset: &Dataset) -> Result<ChartSpec, SectionFailure> {
    require(dataset, REGION_REQUIREMENT)?;
    let slices: Vec<ChartPoint> = sum_by_group(dataset, REGION, SALES_AMOUNT)?
        .into_iter()
        .filter(|group| group.total > 0.0)
        .map(|group| ChartPoint {
            label: group.key,
            value: Some(group.total),
        })
        .collect();
    Ok(ChartSpec::new(ChartKind::Pie, REGION_CHART_TITLE, REGION, SALES_AMOUNT).with_points(slices))
}

fn product_chart(dataset: &Dataset, options: &RenderOptions) -> Result<ChartSpec, SectionFailure> {
    require(dataset, PRODUCT_REQUIREMENT)?;
    let top = top_n_by_sum(dataset, PRODUCT, SALES_AMOUNT, options.top_products)?;
    Ok(
        ChartSpec::new(ChartKind::Bar, PRODUCT_CHART_TITLE, PRODUCT, SALES_AMOUNT).with_points(
            top.into_iter()
                .map(|group| ChartPoint {
                    label: group.key,
                    value: Some(group.total),
                })
                .collect(),
        ),
    )
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
