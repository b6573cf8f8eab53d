use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::store::{Store, ToolId};

/// Semantic type of a catalog tool; selects the prompt template sent to the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    BlogGenerator,
    TitleCreator,
    IdeaSummarizer,
    ContentRewriter,
    EmailComposer,
    SocialMediaCopy,
    /// Anything outside the catalog falls back to a generic writing prompt.
    Generic,
}

impl ToolKind {
    pub const CATALOG: [ToolKind; 6] = [
        ToolKind::BlogGenerator,
        ToolKind::TitleCreator,
        ToolKind::IdeaSummarizer,
        ToolKind::ContentRewriter,
        ToolKind::EmailComposer,
        ToolKind::SocialMediaCopy,
    ];

    pub fn from_name(name: &str) -> Self {
        Self::CATALOG
            .into_iter()
            .find(|kind| kind.name() == name)
            .unwrap_or(ToolKind::Generic)
    }

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::BlogGenerator => "Blog Generator",
            ToolKind::TitleCreator => "Title Creator",
            ToolKind::IdeaSummarizer => "Idea Summarizer",
            ToolKind::ContentRewriter => "Content Rewriter",
            ToolKind::EmailComposer => "Email Composer",
            ToolKind::SocialMediaCopy => "Social Media Copy",
            ToolKind::Generic => "Content Writer",
        }
    }

    fn description(self) -> &'static str {
        match self {
            ToolKind::BlogGenerator => "Generate full blog posts with sections, headings, and engaging content based on your topic.",
            ToolKind::TitleCreator => "Generate attention-grabbing titles for blogs, articles, or social media posts in seconds.",
            ToolKind::IdeaSummarizer => "Transform lengthy concepts into concise, impactful summaries without losing key information.",
            ToolKind::ContentRewriter => "Rewrite existing content to improve readability, tone, or to create multiple variations.",
            ToolKind::EmailComposer => "Create professional emails with appropriate tone and structure for any business context.",
            ToolKind::SocialMediaCopy => "Create platform-specific content that engages followers and drives conversions.",
            ToolKind::Generic => "Create high-quality content based on your prompt.",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            ToolKind::BlogGenerator => "description",
            ToolKind::TitleCreator => "title",
            ToolKind::IdeaSummarizer => "lightbulb",
            ToolKind::ContentRewriter => "autorenew",
            ToolKind::EmailComposer => "email",
            ToolKind::SocialMediaCopy => "share",
            ToolKind::Generic => "edit",
        }
    }

    fn color(self) -> &'static str {
        match self {
            ToolKind::BlogGenerator | ToolKind::ContentRewriter | ToolKind::Generic => "primary",
            ToolKind::TitleCreator | ToolKind::EmailComposer => "secondary",
            ToolKind::IdeaSummarizer | ToolKind::SocialMediaCopy => "accent",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable catalog entry. `icon` and `color` are presentation hints only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Tool {
    pub id: ToolId,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
}

impl Tool {
    /// The fixed six-entry catalog seeded at startup.
    pub fn catalog() -> Vec<Tool> {
        ToolKind::CATALOG
            .into_iter()
            .zip(1..)
            .map(|(kind, id)| Tool {
                id,
                name: kind.name().to_string(),
                description: kind.description().to_string(),
                icon: kind.icon().to_string(),
                color: kind.color().to_string(),
            })
            .collect()
    }

    pub fn kind(&self) -> ToolKind {
        ToolKind::from_name(&self.name)
    }

    pub fn list(store: &Store) -> Vec<Tool> {
        store.tools().to_vec()
    }

    pub fn get(store: &Store, id: ToolId) -> Result<Tool, AppError> {
        store
            .tools()
            .iter()
            .find(|tool| tool.id == id)
            .cloned()
            .ok_or(AppError::NotFound("tool"))
    }
}
