//! Operations and their execution order

use serde::{Deserialize, Serialize};

use crate::format::ReplacementRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Hyperlink,
    Style,
    Text,
    Structure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OperationAction {
    /// Resolve identifiers and rewrite targets and display text
    FixHyperlinks,
    /// Regex rewrite of external hyperlink targets
    ReplaceUrl(ReplacementRule),
    /// Regex rewrite of run text
    ReplaceText(ReplacementRule),
    Whitespace,
    ParagraphStyles,
    CustomStyles,
    ListIndentation,
    Bullets,
    Tables,
    BlankParagraphs,
}

impl OperationAction {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationAction::FixHyperlinks | OperationAction::ReplaceUrl(_) => {
                OperationKind::Hyperlink
            }
            OperationAction::ReplaceText(_) | OperationAction::Whitespace => OperationKind::Text,
            OperationAction::ParagraphStyles
            | OperationAction::CustomStyles
            | OperationAction::ListIndentation
            | OperationAction::Bullets
            | OperationAction::Tables => OperationKind::Style,
            OperationAction::BlankParagraphs => OperationKind::Structure,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OperationAction::FixHyperlinks => "fix_hyperlinks",
            OperationAction::ReplaceUrl(_) => "replace_url",
            OperationAction::ReplaceText(_) => "replace_text",
            OperationAction::Whitespace => "whitespace",
            OperationAction::ParagraphStyles => "paragraph_styles",
            OperationAction::CustomStyles => "custom_styles",
            OperationAction::ListIndentation => "list_indentation",
            OperationAction::Bullets => "bullets",
            OperationAction::Tables => "tables",
            OperationAction::BlankParagraphs => "blank_paragraphs",
        }
    }

    /// Style assignment must precede custom style injection
    pub fn default_priority(&self) -> u32 {
        match self {
            OperationAction::ReplaceUrl(_) => 5,
            OperationAction::FixHyperlinks => 10,
            OperationAction::ReplaceText(_) => 20,
            OperationAction::Whitespace => 30,
            OperationAction::ParagraphStyles => 40,
            OperationAction::CustomStyles => 50,
            OperationAction::ListIndentation => 60,
            OperationAction::Bullets => 65,
            OperationAction::Tables => 70,
            OperationAction::BlankParagraphs => 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(flatten)]
    pub action: OperationAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical: Option<bool>,
}

impl Operation {
    pub fn new(action: OperationAction) -> Self {
        Self {
            action,
            priority: None,
            critical: None,
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn critical(mut self, critical: bool) -> Self {
        self.critical = Some(critical);
        self
    }

    pub fn kind(&self) -> OperationKind {
        self.action.kind()
    }

    pub fn name(&self) -> &'static str {
        self.action.name()
    }

    pub fn effective_priority(&self) -> u32 {
        self.priority
            .unwrap_or_else(|| self.action.default_priority())
    }

    /// Hyperlink fixing is critical unless configured otherwise
    pub fn is_critical(&self) -> bool {
        self.critical
            .unwrap_or(matches!(self.action, OperationAction::FixHyperlinks))
    }
}

impl From<OperationAction> for Operation {
    fn from(action: OperationAction) -> Self {
        Operation::new(action)
    }
}

/// Ascending priority; ties keep their configured order
pub fn sort_operations(operations: &[Operation]) -> Vec<Operation> {
    let mut sorted = operations.to_vec();
    sorted.sort_by_key(Operation::effective_priority);
    sorted
}
