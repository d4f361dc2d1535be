//! The closed set of generation operations.
//!
//! Constructors perform input validation (step 1 of the mediation skeleton);
//! an `Operation` value is always well-formed. File-bearing variants own their
//! `StagedUpload`, so dropping the operation on any path removes the file.

use serde_json::Value;

use crate::errors::AppError;
use crate::staging::StagedUpload;

/// How an operation is entitled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Open to free principals until the quota runs out; charged per success.
    FreeQuota,
    /// Premium principals only; never charged.
    PremiumOnly,
}

#[derive(Debug)]
pub enum Operation {
    Article { prompt: String, length: u32 },
    BlogTitle { prompt: String },
    Image { prompt: String, publish: bool },
    RemoveBackground { image: StagedUpload },
    RemoveObject { image: StagedUpload, object: String },
    ResumeReview { resume: StagedUpload },
}

fn required_text(value: Option<String>, message: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput(message.to_string()))
}

/// `length` arrives as a JSON number or a numeric string.
fn parse_length(value: Option<&Value>) -> Option<u32> {
    let length = match value? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    length.filter(|v| *v > 0)
}

impl Operation {
    pub fn article(prompt: Option<String>, length: Option<&Value>) -> Result<Self, AppError> {
        const MESSAGE: &str = "Prompt and length are required";
        let prompt = required_text(prompt, MESSAGE)?;
        let length = parse_length(length).ok_or_else(|| AppError::InvalidInput(MESSAGE.to_string()))?;
        Ok(Operation::Article { prompt, length })
    }

    pub fn blog_title(prompt: Option<String>) -> Result<Self, AppError> {
        Ok(Operation::BlogTitle {
            prompt: required_text(prompt, "Prompt is required")?,
        })
    }

    pub fn image(prompt: Option<String>, publish: Option<bool>) -> Result<Self, AppError> {
        Ok(Operation::Image {
            prompt: required_text(prompt, "Prompt is required")?,
            publish: publish.unwrap_or(false),
        })
    }

    pub fn remove_background(image: Option<StagedUpload>) -> Result<Self, AppError> {
        let image = image.ok_or_else(|| AppError::InvalidInput("No file uploaded".to_string()))?;
        Ok(Operation::RemoveBackground { image })
    }

    pub fn remove_object(image: Option<StagedUpload>, object: Option<String>) -> Result<Self, AppError> {
        let image = image.ok_or_else(|| AppError::InvalidInput("Image file is required".to_string()))?;
        // `image` is dropped (and deleted) if the object name is missing.
        let object = required_text(object, "Object to remove is required")?;
        Ok(Operation::RemoveObject {
            image,
            object: object.trim().to_string(),
        })
    }

    pub fn resume_review(resume: Option<StagedUpload>) -> Result<Self, AppError> {
        let resume =
            resume.ok_or_else(|| AppError::InvalidInput("Resume file is required".to_string()))?;
        Ok(Operation::ResumeReview { resume })
    }

    pub fn gate(&self) -> Gate {
        match self {
            Operation::Article { .. } | Operation::BlogTitle { .. } => Gate::FreeQuota,
            Operation::Image { .. }
            | Operation::RemoveBackground { .. }
            | Operation::RemoveObject { .. }
            | Operation::ResumeReview { .. } => Gate::PremiumOnly,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Article { .. } => "generate-article",
            Operation::BlogTitle { .. } => "generate-blog-title",
            Operation::Image { .. } => "generate-image",
            Operation::RemoveBackground { .. } => "remove-image-background",
            Operation::RemoveObject { .. } => "remove-image-object",
            Operation::ResumeReview { .. } => "resume-review",
        }
    }

    /// Client-facing message for upstream failures.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::Article { .. } => "Failed to generate article.",
            Operation::BlogTitle { .. } => "Failed to generate blog title.",
            Operation::Image { .. } => "Failed to generate image.",
            Operation::RemoveBackground { .. } => "Failed to remove background. Please try again.",
            Operation::RemoveObject { .. } => "Failed to remove object.",
            Operation::ResumeReview { .. } => "Failed to review resume.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_article_requires_prompt_and_length() {
        assert!(Operation::article(Some("dogs".into()), Some(&json!(800))).is_ok());
        assert!(Operation::article(Some("dogs".into()), Some(&json!("1200"))).is_ok());
        assert!(Operation::article(Some("dogs".into()), None).is_err());
        assert!(Operation::article(Some("dogs".into()), Some(&json!(0))).is_err());
        assert!(Operation::article(Some("dogs".into()), Some(&json!("long"))).is_err());
        assert!(Operation::article(Some("   ".into()), Some(&json!(800))).is_err());
        assert!(Operation::article(None, Some(&json!(800))).is_err());
    }

    #[test]
    fn test_article_length_is_carried() {
        match Operation::article(Some("dogs".into()), Some(&json!("1200"))).unwrap() {
            Operation::Article { length, .. } => assert_eq!(length, 1200),
            other => panic!("unexpected operation {other:?}"),
        }
    }

    #[test]
    fn test_image_publish_defaults_false() {
        match Operation::image(Some("a fox".into()), None).unwrap() {
            Operation::Image { publish, .. } => assert!(!publish),
            other => panic!("unexpected operation {other:?}"),
        }
    }

    #[test]
    fn test_missing_uploads_are_invalid() {
        let err = Operation::remove_background(None).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(m) if m == "No file uploaded"));
        let err = Operation::resume_review(None).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(m) if m == "Resume file is required"));
        let err = Operation::remove_object(None, Some("cat".into())).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(m) if m == "Image file is required"));
    }

    #[test]
    fn test_gates() {
        assert_eq!(Operation::blog_title(Some("x".into())).unwrap().gate(), Gate::FreeQuota);
        assert_eq!(Operation::image(Some("x".into()), Some(true)).unwrap().gate(), Gate::PremiumOnly);
    }
}
