// Prompt templates and fixed output bounds for the text operations.
// Article and blog-title prompts are passed through verbatim.

/// Output bound for blog titles.
pub const BLOG_TITLE_MAX_TOKENS: u32 = 500;

/// Output bound for resume feedback.
pub const RESUME_REVIEW_MAX_TOKENS: u32 = 1000;

pub const RESUME_REVIEW_PROMPT: &str =
    "Review this resume and give constructive feedback:\n\n{resume_text}";

pub fn resume_review_prompt(resume_text: &str) -> String {
    RESUME_REVIEW_PROMPT.replace("{resume_text}", resume_text.trim())
}
