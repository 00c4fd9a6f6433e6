/// Prompt templates for the judge
pub struct JudgePrompts;

impl JudgePrompts {
    /// Build the rubric prompt for one story
    pub fn build_evaluation_prompt(request: &str, story: &str) -> String {
        format!(
            r#"You are a children's literature editor. Evaluate the story on the essentials of a great bedtime story.

## User Request
{request}

## Story
{story}

---

## Rubric

Score each criterion 0-10 and justify each briefly:

1. **CLEAR OBSTACLE**: One specific problem drives the story. What is it?
2. **REAL STRUGGLE**: The character tries and fails before succeeding, showing effort and learning.
3. **LESSON EMBEDDED**: The lesson is shown through actions, not told at the end. What is learned, and how?
4. **PLOT MOMENTUM**: Actions move the story forward rather than description alone.
5. **SENSORY DETAIL**: Simple, vivid specifics (sounds, colors, textures).
6. **AGE-APPROPRIATE**: Safe and gentle for ages 5-10.
7. **BEDTIME READY**: A calming, warm ending.
8. **DIALOGUE**: 3-5 natural lines that reveal character or move the plot. Count them.
9. **WORD COUNT**: Aim for about 1200 words (1000-1400 is acceptable).
10. **MAGIC & WONDER**: Gentle imagination suited to children.

A story passes only if clear_obstacle >= 8, real_struggle >= 8, lesson_embedded >= 8, age_appropriate >= 9 and word_count >= 7.

---

## Required Response Format

Return JSON only, with exactly these keys:

```json
{{
  "reasoning": {{
    "obstacle": "<clear and concrete?>",
    "struggle": "<tries, fails, learns?>",
    "lesson": "<what and how?>",
    "plot": "<moves or meanders?>",
    "sensory": "<specifics?>",
    "age": "<safe?>",
    "bedtime": "<calming?>",
    "dialogue": "<count and quality>",
    "word_count": "<approximate count>",
    "magic": "<gentle wonder?>"
  }},
  "scores": {{
    "clear_obstacle": <0-10>,
    "real_struggle": <0-10>,
    "lesson_embedded": <0-10>,
    "plot_momentum": <0-10>,
    "sensory_detail": <0-10>,
    "age_appropriate": <0-10>,
    "bedtime_ready": <0-10>,
    "dialogue": <0-10>,
    "word_count": <0-10>,
    "magic_and_wonder": <0-10>
  }},
  "overall_score": <average of all scores>,
  "passes": <true or false>,
  "feedback": "<Concrete fixes with brief quotes: clarify the obstacle? add a failed attempt? embed the lesson in action? tighten the ending?>"
}}
```

Scores must be whole numbers."#,
            request = request,
            story = story,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Criterion;

    #[test]
    fn test_prompt_embeds_request_and_story() {
        let prompt = JudgePrompts::build_evaluation_prompt("a brave mouse", "Once upon a time...");
        assert!(prompt.contains("a brave mouse"));
        assert!(prompt.contains("Once upon a time..."));
    }

    #[test]
    fn test_prompt_names_every_wire_key() {
        let prompt = JudgePrompts::build_evaluation_prompt("r", "s");
        for criterion in Criterion::ALL {
            assert!(prompt.contains(&format!("\"{}\"", criterion.score_key())));
            assert!(prompt.contains(&format!("\"{}\"", criterion.reasoning_key())));
        }
    }
}
