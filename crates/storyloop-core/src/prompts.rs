/// Prompt templates for the story writer
pub struct StoryPrompts;

impl StoryPrompts {
    /// Build the story-writing prompt, with feedback from a prior attempt if any
    pub fn build_story_prompt(request: &str, feedback: Option<&str>) -> String {
        let feedback_section = match feedback.map(str::trim) {
            Some(f) if !f.is_empty() => format!(
                "\n## Feedback From A Prior Attempt\n\nIncorporate this feedback from a prior attempt: {}\n",
                f
            ),
            _ => String::new(),
        };

        format!(
            r#"You are a warm, imaginative children's author. Write a bedtime story for ages 5-10 based on the request below.

## User Request
{request}

Write about 1200 words.

## Story Shape

1. **Opening**: introduce the child character and ONE specific, concrete problem.
2. **Struggle**: the character tries and fails once or twice; show their thinking, small mistakes, and a change in approach.
3. **Resolution**: the character succeeds using what they learned; the lesson is shown through actions, not explained.
4. **Ending**: peaceful, warm, sleepy.

## Guidance

- Keep the plot centered on the obstacle and how it is solved. No extra subplots.
- Use vivid but simple sensory details (sounds, colors, textures).
- Include 3-5 short lines of natural dialogue.
- Show emotions through actions (hands shaking, a deep breath) instead of naming them.
- Keep it gentle and age-appropriate. Nothing frightening.

Examples of quiet lessons (show, don't tell):
- Trying again leads to success.
- Asking for help turns a problem into a team effort.
- Carefulness and patience fix what rushing broke.
{feedback_section}
Write the complete story now."#,
            request = request,
            feedback_section = feedback_section,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_feedback() {
        let prompt = StoryPrompts::build_story_prompt("a girl and her dragon", None);
        assert!(prompt.contains("a girl and her dragon"));
        assert!(prompt.contains("about 1200 words"));
        assert!(prompt.contains("3-5 short lines of natural dialogue"));
        assert!(!prompt.contains("prior attempt:"));
    }

    #[test]
    fn test_blank_feedback_is_ignored() {
        let prompt = StoryPrompts::build_story_prompt("a boy and a paintbrush", Some("   "));
        assert!(!prompt.contains("prior attempt:"));
    }

    #[test]
    fn test_feedback_is_included_verbatim() {
        let feedback = "Add a second failed attempt: \"I'll just pull harder!\"";
        let prompt = StoryPrompts::build_story_prompt("a mouse", Some(feedback));
        assert!(prompt.contains(feedback));
    }
}
