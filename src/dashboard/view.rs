//! Rendered output of one interaction, and its HTML form.

use std::fmt::Write as _;

use crate::charts::escape;

use super::Section;

/// One element of a rendered view, in display order.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    /// Green status banner.
    Success(String),
    /// Red status banner.
    Error(String),
    /// Plain text, shown as-is.
    Message(String),
    /// Inline SVG with its accessible caption.
    Chart { svg: String, caption: String },
    /// Two-column key/value table.
    Table {
        value_header: String,
        rows: Vec<(String, String)>,
    },
}

/// How an interaction ended, for the frontend and the interaction log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No complete identifier typed yet.
    Idle,
    Rendered,
    InvalidInput,
    NotFound,
    ApiStatus(u16),
    ApiRefusal,
    ApiTransport,
    ApiMalformed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Rendered => "rendered",
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::ApiStatus(_) => "api_status",
            Self::ApiRefusal => "api_refusal",
            Self::ApiTransport => "api_transport",
            Self::ApiMalformed => "api_malformed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Rendered | Self::Idle)
    }
}

/// Everything produced for one interaction.
#[derive(Debug, Clone)]
pub struct View {
    pub section: Section,
    pub client_id: Option<u32>,
    pub outcome: Outcome,
    pub blocks: Vec<Block>,
}

impl View {
    /// A view holding a single message and nothing else.
    pub fn failure(section: Section, client_id: Option<u32>, outcome: Outcome, message: String) -> Self {
        Self {
            section,
            client_id,
            outcome,
            blocks: vec![Block::Message(message)],
        }
    }

    pub fn chart_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::Chart { .. }))
            .count()
    }

    /// HTML fragment that replaces the view container wholesale.
    pub fn to_html(&self) -> String {
        let mut html = format!(
            "<section class=\"view\" data-section=\"{}\">",
            self.section.slug()
        );
        if matches!(self.outcome, Outcome::Idle) {
            html.push_str("</section>");
            return html;
        }
        html.push_str("<hr>");
        for block in &self.blocks {
            match block {
                Block::Heading { level, text } => {
                    let level = (*level).clamp(1, 6);
                    let _ = write!(html, "<h{level}>{}</h{level}>", escape(text));
                }
                Block::Success(text) => {
                    let _ = write!(html, "<div class=\"alert success\" role=\"status\">{}</div>", escape(text));
                }
                Block::Error(text) => {
                    let _ = write!(html, "<div class=\"alert error\" role=\"alert\">{}</div>", escape(text));
                }
                Block::Message(text) => {
                    let _ = write!(html, "<p class=\"message\">{}</p>", escape(text));
                }
                Block::Chart { svg, caption } => {
                    let _ = write!(
                        html,
                        "<figure class=\"chart\">{svg}<figcaption class=\"custom-caption\">{}</figcaption></figure>",
                        escape(caption)
                    );
                }
                Block::Table { value_header, rows } => {
                    let _ = write!(
                        html,
                        "<table class=\"st-table\"><thead><tr><th></th><th>{}</th></tr></thead><tbody>",
                        escape(value_header)
                    );
                    for (key, value) in rows {
                        let _ = write!(
                            html,
                            "<tr><th>{}</th><td>{}</td></tr>",
                            escape(key),
                            escape(value)
                        );
                    }
                    html.push_str("</tbody></table>");
                }
            }
        }
        html.push_str("</section>");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_view_holds_only_the_message() {
        let view = View::failure(
            Section::Prediction,
            Some(100002),
            Outcome::ApiStatus(500),
            "Error while querying the scoring API".to_string(),
        );
        assert_eq!(view.blocks.len(), 1);
        assert_eq!(view.chart_count(), 0);
        let html = view.to_html();
        assert!(html.contains("<p class=\"message\">Error while querying the scoring API</p>"));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn html_escapes_text_but_not_svg() {
        let view = View {
            section: Section::Descriptive,
            client_id: Some(100002),
            outcome: Outcome::Rendered,
            blocks: vec![
                Block::Heading {
                    level: 2,
                    text: "<b>".to_string(),
                },
                Block::Chart {
                    svg: "<svg></svg>".to_string(),
                    caption: "a & b".to_string(),
                },
                Block::Table {
                    value_header: "Value".to_string(),
                    rows: vec![("NAME".to_string(), "<x>".to_string())],
                },
            ],
        };
        let html = view.to_html();
        assert!(html.contains("<h2>&lt;b&gt;</h2>"));
        assert!(html.contains("<figure class=\"chart\"><svg></svg>"));
        assert!(html.contains("a &amp; b"));
        assert!(html.contains("<tr><th>NAME</th><td>&lt;x&gt;</td></tr>"));
        assert!(html.contains("data-section=\"descriptive\""));
    }

    #[test]
    fn idle_view_is_empty() {
        let view = View {
            section: Section::Bivariate,
            client_id: None,
            outcome: Outcome::Idle,
            blocks: Vec::new(),
        };
        assert_eq!(
            view.to_html(),
            "<section class=\"view\" data-section=\"bivariate\"></section>"
        );
    }

    #[test]
    fn outcome_names_are_stable() {
        assert_eq!(Outcome::ApiStatus(404).as_str(), "api_status");
        assert!(Outcome::Rendered.is_success());
        assert!(!Outcome::NotFound.is_success());
    }
}
