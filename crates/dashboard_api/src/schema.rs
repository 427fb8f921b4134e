use shared::domain::Section;

use crate::dataset::Dataset;

pub const SALES_DATE: &str = "sales_date";
pub const SALES_AMOUNT: &str = "sales_amount";
pub const REGION: &str = "region";
pub const PRODUCT: &str = "product";

/// Columns a section needs before it can chart anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRequirement {
    pub section: Section,
    pub columns: &'static [&'static str],
    pub purpose: &'static str,
}

pub const SALES_REQUIREMENT: ColumnRequirement = ColumnRequirement {
    section: Section::Sales,
    columns: &[SALES_DATE, SALES_AMOUNT],
    purpose: "sales visualization",
};

pub const REGION_REQUIREMENT: ColumnRequirement = ColumnRequirement {
    section: Section::Region,
    columns: &[REGION, SALES_AMOUNT],
    purpose: "customer segmentation",
};

pub const PRODUCT_REQUIREMENT: ColumnRequirement = ColumnRequirement {
    section: Section::Product,
    columns: &[PRODUCT, SALES_AMOUNT],
    purpose: "product analysis",
};

pub const CHART_REQUIREMENTS: [ColumnRequirement; 3] =
    [SALES_REQUIREMENT, REGION_REQUIREMENT, PRODUCT_REQUIREMENT];

impl ColumnRequirement {
    pub fn for_section(section: Section) -> Option<Self> {
        CHART_REQUIREMENTS
            .into_iter()
            .find(|requirement| requirement.section == section)
    }

    /// Warning shown when the dataset lacks any of the columns. Always names
    /// every required column, not only the absent ones.
    pub fn warning_message(&self) -> String {
        let quoted: Vec<String> = self
            .columns
            .iter()
            .map(|column| format!("'{column}'"))
            .collect();
        format!(
            "⚠️ Please ensure your data has {} columns for {}.",
            quoted.join(" and "),
            self.purpose
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Satisfied(Vec<&'static str>),
    MissingColumns(Vec<&'static str>),
}

impl ValidationOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, ValidationOutcome::Satisfied(_))
    }
}

pub fn validate(dataset: &Dataset, requirement: &ColumnRequirement) -> ValidationOutcome {
    let missing: Vec<&'static str> = requirement
        .columns
        .iter()
        .copied()
        .filter(|column| !dataset.has_column(column))
        .collect();
    if missing.is_empty() {
        ValidationOutcome::Satisfied(requirement.columns.to_vec())
    } else {
        ValidationOutcome::MissingColumns(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_only_absent_columns() {
        let dataset = Dataset::from_csv_str("sales_amount,product\n1,A\n").expect("dataset");
        assert_eq!(
            validate(&dataset, &SALES_REQUIREMENT),
            ValidationOutcome::MissingColumns(vec![SALES_DATE])
        );
        assert!(validate(&dataset, &PRODUCT_REQUIREMENT).is_satisfied());
    }

    #[test]
    fn warning_names_both_required_columns() {
        let message = SALES_REQUIREMENT.warning_message();
        assert!(message.contains("'sales_date' and 'sales_amount'"));
        assert!(REGION_REQUIREMENT
            .warning_message()
            .contains("'region' and 'sales_amount'"));
    }

    #[test]
    fn feedback_has_no_column_requirement() {
        assert!(ColumnRequirement::for_section(Section::Feedback).is_none());
        assert_eq!(
            ColumnRequirement::for_section(Section::Product),
            Some(PRODUCT_REQUIREMENT)
        );
    }
}
