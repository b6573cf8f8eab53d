use crate::models::ToolKind;

pub struct Prompts;

impl Prompts {
    pub const DEFAULT_TONE: &'static str = "Professional";
    pub const DEFAULT_LENGTH: &'static str = "Standard";

    const BLOG_GENERATOR: &'static str = "You are a professional blog writer. Create a well-structured blog post with headings, paragraphs, and relevant content.";
    const TITLE_CREATOR: &'static str = "You are a title generation expert. Create a list of 10 attention-grabbing, clickable titles for content.";
    const IDEA_SUMMARIZER: &'static str = "You are a summarization expert. Transform the given text into a concise, impactful summary that captures the key points.";
    const CONTENT_REWRITER: &'static str = "You are a content rewriting specialist. Rewrite the provided content while maintaining its meaning but improving its clarity, readability, and engagement.";
    const EMAIL_COMPOSER: &'static str = "You are an email writing expert. Create a professional email that is clear, concise, and effective.";
    const SOCIAL_MEDIA_COPY: &'static str = "You are a social media copywriter. Create engaging, platform-specific content that drives engagement.";
    const GENERIC: &'static str = "You are a professional content writer. Create high-quality content based on the given prompt.";

    /// System prompt for `kind`. Title lists have a fixed size, so they ignore `length`.
    pub fn system_prompt(kind: ToolKind, tone: &str, length: &str) -> String {
        let instructions = match kind {
            ToolKind::BlogGenerator => Self::BLOG_GENERATOR,
            ToolKind::TitleCreator => {
                return format!("{} The tone should be {}.", Self::TITLE_CREATOR, tone);
            }
            ToolKind::IdeaSummarizer => Self::IDEA_SUMMARIZER,
            ToolKind::ContentRewriter => Self::CONTENT_REWRITER,
            ToolKind::EmailComposer => Self::EMAIL_COMPOSER,
            ToolKind::SocialMediaCopy => Self::SOCIAL_MEDIA_COPY,
            ToolKind::Generic => Self::GENERIC,
        };

        format!(
            "{} The tone should be {}. Length should be {}.",
            instructions, tone, length
        )
    }
}
