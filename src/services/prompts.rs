use crate::models::{Message, ProficiencyLevel, SceneContext};

const DEFAULT_NATIVE_LANGUAGE: &str = "English";

/// Renders history as a chronological `role: text` transcript.
pub fn render_history(history: &[Message]) -> String {
    history
        .iter()
        .map(|msg| format!("{}: {}", msg.role.as_str(), msg.text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

/// Builds the feedback-only tutor instruction. The model is told to answer
/// with a single JSON object carrying `tutor_message` and the four feedback
/// collections, and nothing else.
pub fn compose_tutor_prompt(
    scene: &SceneContext,
    history: &[Message],
    native_language: Option<&str>,
) -> String {
    let native_language = native_language
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_NATIVE_LANGUAGE);

    format!(
        r#"You are an English tutor reviewing a learner's latest utterance in a scene-based conversation. The current scene is: {title}.

**Scene Information:**
- Setting: {setting}
- Key Vocabulary: {vocabulary}
- Common Phrases: {phrases}
- Questions to Ask: {questions}

**Conversation History:**
{history}

**Your Tasks:**
1. Examine ONLY the learner's language: unfamiliar words they should learn, grammar errors, awkward expressions, and words with a more precise alternative.
2. Do NOT continue the conversation. Your output is feedback, not dialogue.
3. Write a short encouraging note to the learner in {native_language}.

**CRITICAL RESPONSE FORMAT INSTRUCTIONS:**
- Your ENTIRE response MUST be one VALID JSON object and nothing else.
- Do NOT wrap the JSON in markdown fences or surround it with prose.
- The object MUST have EXACTLY two keys: "tutor_message" and "feedback".
- "tutor_message" is the short encouraging note in {native_language}.
- "feedback" MUST be a JSON object with EXACTLY these keys:
  * "unfamiliar_words": JSON array of words the learner may not know
  * "grammar_errors": JSON object mapping incorrect sentences to corrected sentences
  * "not_so_good_expressions": JSON object mapping awkward phrases to better alternatives
  * "best_fit_words": JSON object mapping the learner's words to more precise alternatives
- If nothing applies, use empty arrays/objects. Never omit a key.

**Example Response:**
{{"tutor_message": "Nice work! Keep going.", "feedback": {{"unfamiliar_words": ["itinerary"], "grammar_errors": {{"I go to the airport yesterday": "I went to the airport yesterday"}}, "not_so_good_expressions": {{}}, "best_fit_words": {{"big": "spacious"}}}}}}"#,
        title = scene.title,
        setting = scene.setting,
        vocabulary = join_or_none(&scene.vocabulary),
        phrases = join_or_none(&scene.phrases),
        questions = join_or_none(&scene.questions),
        history = render_history(history),
        native_language = native_language,
    )
}

/// Builds the in-character conversation partner instruction. No feedback
/// JSON is requested; lower levels get shorter replies.
pub fn compose_partner_prompt(
    scene: &SceneContext,
    level: ProficiencyLevel,
    history: &[Message],
) -> String {
    let brevity = if level.is_beginner() {
        "Keep your reply to one short, simple sentence. Use common words only."
    } else {
        "Keep your reply brief: one or two natural sentences."
    };

    format!(
        r#"You are a real person inside the following scene, talking with an English learner at level {level}. Stay fully in character and never mention that this is practice. The current scene is: {title}.

**Scene Information:**
- Setting: {setting}
- Key Vocabulary: {vocabulary}
- Common Phrases: {phrases}
- Questions to Ask: {questions}

**Conversation History:**
{history}

**Instructions:**
- Respond ONLY as your character in the scene, continuing the conversation.
- {brevity}
- Do not correct the learner and do not produce any feedback or JSON.
- Ask one of the scene questions when the conversation stalls."#,
        level = level.as_str(),
        title = scene.title,
        setting = scene.setting,
        vocabulary = join_or_none(&scene.vocabulary),
        phrases = join_or_none(&scene.phrases),
        questions = join_or_none(&scene.questions),
        history = render_history(history),
        brevity = brevity,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRole;
    use chrono::Utc;
    use uuid::Uuid;

    fn scene() -> SceneContext {
        SceneContext {
            title: "At the Cafe".into(),
            setting: "A small cafe at lunchtime.".into(),
            vocabulary: vec!["latte".into(), "pastry".into()],
            phrases: vec!["for here or to go".into()],
            questions: vec!["What would you like to order?".into()],
        }
    }

    fn msg(role: MessageRole, text: &str) -> Message {
        Message {
            id: 0,
            session_id: Uuid::nil(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_history_renders_role_tagged_lines() {
        let history = vec![
            msg(MessageRole::User, "Hello"),
            msg(MessageRole::Assistant, "Hi there"),
        ];
        assert_eq!(render_history(&history), "user: Hello\nassistant: Hi there");
    }

    #[test]
    fn test_tutor_prompt_requests_canonical_contract() {
        let prompt = compose_tutor_prompt(&scene(), &[], Some("Spanish"));
        assert!(prompt.contains("\"tutor_message\""));
        assert!(prompt.contains("\"unfamiliar_words\""));
        assert!(prompt.contains("\"grammar_errors\""));
        assert!(prompt.contains("\"not_so_good_expressions\""));
        assert!(prompt.contains("\"best_fit_words\""));
        assert!(prompt.contains("Spanish"));
        assert!(prompt.contains("empty arrays/objects"));
    }

    #[test]
    fn test_tutor_prompt_defaults_native_language() {
        let prompt = compose_tutor_prompt(&scene(), &[], None);
        assert!(prompt.contains("note to the learner in English"));
        let blank = compose_tutor_prompt(&scene(), &[], Some("  "));
        assert!(blank.contains("note to the learner in English"));
    }

    #[test]
    fn test_empty_vocabulary_is_not_an_error() {
        let bare = SceneContext {
            title: "Anywhere".into(),
            setting: "Somewhere".into(),
            ..Default::default()
        };
        let prompt = compose_tutor_prompt(&bare, &[], None);
        assert!(prompt.contains("Key Vocabulary: none"));
    }

    #[test]
    fn test_partner_prompt_scales_brevity_for_beginners() {
        let a1 = compose_partner_prompt(&scene(), ProficiencyLevel::A1, &[]);
        let c1 = compose_partner_prompt(&scene(), ProficiencyLevel::C1, &[]);
        assert!(a1.contains("one short, simple sentence"));
        assert!(c1.contains("one or two natural sentences"));
        assert!(!a1.contains("JSON object"));
    }

    #[test]
    fn test_partner_prompt_embeds_history_and_scene() {
        let history = vec![msg(MessageRole::User, "I want coffee")];
        let prompt = compose_partner_prompt(&scene(), ProficiencyLevel::B1, &history);
        assert!(prompt.contains("user: I want coffee"));
        assert!(prompt.contains("At the Cafe"));
        assert!(prompt.contains("latte, pastry"));
    }
}
