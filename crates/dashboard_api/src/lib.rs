pub mod aggregate;
pub mod dataset;
pub mod html;
pub mod render;
pub mod schema;

use shared::{
    domain::Section,
    error::{ApiError, ApiException, ErrorCode},
};

pub use aggregate::SalesOrdering;
pub use dataset::{Dataset, DatasetError};
pub use html::{render_html, HtmlOptions};
pub use render::{render_load_error, render_page, RenderOptions};
pub use schema::{validate, ColumnRequirement, ValidationOutcome, CHART_REQUIREMENTS};

/// Parses an upload. An empty body means no file was chosen.
pub fn load_dataset(bytes: &[u8]) -> Result<Option<Dataset>, DatasetError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    Dataset::from_csv_bytes(bytes).map(Some)
}

/// Validation outcome of every chart section, in page order.
pub fn section_report(dataset: &Dataset) -> Vec<(Section, ValidationOutcome)> {
    CHART_REQUIREMENTS
        .iter()
        .map(|requirement| (requirement.section, validate(dataset, requirement)))
        .collect()
}

impl From<DatasetError> for ApiException {
    fn from(value: DatasetError) -> Self {
        let code = if value.is_malformed_input() {
            ErrorCode::Validation
        } else {
            ErrorCode::Internal
        };
        ApiException::new(code, value.to_string())
    }
}

pub fn dataset_error(err: DatasetError) -> ApiError {
    ApiException::from(err).into()
}
