use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new_random() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn parse(raw: &str) -> Option<Self> {
                Uuid::parse_str(raw.trim()).ok().map(Self)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_newtype!(SessionId);

/// One independent panel of the dashboard body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Sales,
    Region,
    Product,
    Feedback,
}

impl Section {
    pub fn title(self) -> &'static str {
        match self {
            Section::Sales => "📈 Sales Insights",
            Section::Region => "🌍 Customer Segmentation",
            Section::Product => "📊 Product Analysis",
            Section::Feedback => "💬 Feedback (Your Opinion Counts)",
        }
    }
}

/// What the user did to trigger the current render pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Interaction {
    #[default]
    View,
    Upload,
    SubmitFeedback {
        text: String,
    },
}

impl Interaction {
    pub fn feedback_submitted(&self) -> bool {
        matches!(self, Interaction::SubmitFeedback { .. })
    }
}
