//! Dashboard controller: client lookup, remote scoring and the four views.
//!
//! One call to [`render`] is one operator interaction. It runs to completion
//! and returns a fresh [`View`]; nothing is carried over from the previous
//! interaction, so switching sections never reuses a chart or table.
//!
//! Flow: identifier → lookup in both tables → scoring request → reply
//! branch → section-specific blocks built from local data only.

mod sections;
pub mod view;

use std::fmt;

use crate::context::DashboardContext;
use crate::data::LookupError;
use crate::scoring::{PredictionService, ScoringError, ScoringReply};

pub use view::{Block, Outcome, View};

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// The four mutually exclusive views of the sidebar selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Section {
    #[default]
    Prediction,
    Interpretation,
    Descriptive,
    Bivariate,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Self::Prediction,
        Self::Interpretation,
        Self::Descriptive,
        Self::Bivariate,
    ];

    /// Identifier used in URLs and logs.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Prediction => "prediction",
            Self::Interpretation => "interpretation",
            Self::Descriptive => "descriptive",
            Self::Bivariate => "bivariate",
        }
    }

    /// Label shown in the sidebar.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Prediction => "Model prediction",
            Self::Interpretation => "Prediction interpretation",
            Self::Descriptive => "Client descriptive information",
            Self::Bivariate => "Bivariate analysis",
        }
    }

    pub fn parse(val: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.slug().eq_ignore_ascii_case(val.trim()))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Operator input for one interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderRequest {
    /// Identifier exactly as typed.
    pub client_id: String,
    pub section: Section,
    /// Features to compare in the descriptive view.
    pub features: Vec<String>,
    /// Bivariate axes; default to the first display column.
    pub feature_x: Option<String>,
    pub feature_y: Option<String>,
}

impl RenderRequest {
    pub fn new(client_id: impl Into<String>, section: Section) -> Self {
        Self {
            client_id: client_id.into(),
            section,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

impl From<&LookupError> for Outcome {
    fn from(err: &LookupError) -> Self {
        match err {
            LookupError::InvalidLength(_) | LookupError::NotNumeric(_) => Self::InvalidInput,
            LookupError::NotFound(_) => Self::NotFound,
        }
    }
}

impl From<&ScoringError> for Outcome {
    fn from(err: &ScoringError) -> Self {
        match err {
            ScoringError::Status(code) => Self::ApiStatus(*code),
            ScoringError::Transport(_) => Self::ApiTransport,
            ScoringError::Malformed(_) => Self::ApiMalformed,
        }
    }
}

/// Run one interaction end to end.
///
/// Until a full identifier is typed the view stays empty. Lookup and scoring
/// failures produce a single message and stop that interaction.
pub fn render(
    ctx: &DashboardContext,
    service: &dyn PredictionService,
    request: &RenderRequest,
) -> View {
    let section = request.section;

    if request.client_id.is_empty() {
        return View {
            section,
            client_id: None,
            outcome: Outcome::Idle,
            blocks: Vec::new(),
        };
    }

    let selection = match ctx.dataset.lookup_client(&request.client_id) {
        Ok(selection) => selection,
        Err(err) => return View::failure(section, None, Outcome::from(&err), err.to_string()),
    };

    let prediction = match service.fetch_prediction(selection.id) {
        Ok(ScoringReply::Scored(prediction)) => prediction,
        Ok(ScoringReply::Refusal(message)) => {
            return View::failure(section, Some(selection.id), Outcome::ApiRefusal, message);
        }
        Err(err) => {
            return View::failure(section, Some(selection.id), Outcome::from(&err), err.to_string());
        }
    };

    let blocks = match section {
        Section::Prediction => sections::prediction(&selection, &prediction),
        Section::Interpretation => sections::interpretation(ctx, &selection),
        Section::Descriptive => sections::descriptive(ctx, &selection, &request.features),
        Section::Bivariate => {
            let first = ctx.dataset.clients().display_columns().first().map(|c| c.to_string());
            let x = request.feature_x.clone().or_else(|| first.clone());
            let y = request.feature_y.clone().or(first);
            sections::bivariate(ctx, &selection, x.as_deref(), y.as_deref())
        }
    };

    View {
        section,
        client_id: Some(selection.id),
        outcome: Outcome::Rendered,
        blocks,
    }
}
