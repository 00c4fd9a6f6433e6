use serde::Serialize;
use std::fmt;

/// Request used when the user doesn't type one
pub const EXAMPLE_REQUEST: &str =
    "A story about a girl named Alice and her best friend Bob, who happens to be a cat.";

/// What the user asked for, possibly extended with revision feedback
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StoryRequest {
    text: String,
}

impl StoryRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn example() -> Self {
        Self::new(EXAMPLE_REQUEST)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Build a revised request from this one.
    ///
    /// Always call this on the original request: revisions don't stack.
    pub fn with_revision(&self, feedback: &str) -> Self {
        Self::new(format!(
            "{}. User also requested: {}",
            self.text.trim_end_matches('.'),
            feedback.trim()
        ))
    }
}

impl fmt::Display for StoryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// One generated story
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Story {
    text: String,
}

impl Story {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Approximate word count (whitespace-separated tokens)
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

impl fmt::Display for Story {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revision_builds_on_original() {
        let original = StoryRequest::new("A brave mouse explores a castle");
        let first = original.with_revision("Make it funnier");
        let second = original.with_revision("  Add a talking owl \n");

        assert_eq!(
            first.as_str(),
            "A brave mouse explores a castle. User also requested: Make it funnier"
        );
        assert_eq!(
            second.as_str(),
            "A brave mouse explores a castle. User also requested: Add a talking owl"
        );
        assert!(!second.as_str().contains("funnier"));
    }

    #[test]
    fn test_revision_does_not_double_period() {
        let revised = StoryRequest::example().with_revision("Make it shorter");
        assert!(revised.as_str().contains("cat. User also requested: Make it shorter"));
        assert!(!revised.as_str().contains(".."));
    }

    #[test]
    fn test_word_count() {
        let story = Story::new("Once upon a time,\n\nthere was   a cat.");
        assert_eq!(story.word_count(), 8);
        assert_eq!(Story::new("").word_count(), 0);
    }
}
