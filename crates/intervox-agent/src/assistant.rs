// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assistant definitions and template variables handed to the call backend.

use intervox_core::types::{AssistantConfig, CallVariables};

const MODEL_PROVIDER: &str = "openai";
const MODEL: &str = "gpt-4";

/// Assistant that gathers interview parameters through conversation.
///
/// The system prompt demands a final message of exactly `<marker> {json}`.
pub fn collector_assistant(user_name: &str, marker: &str) -> AssistantConfig {
    AssistantConfig {
        name: "Interview Builder".to_string(),
        first_message: format!(
            "Hello {user_name}! I'm here to help you create a personalized interview. \
             Let me ask you a few questions to generate the perfect interview for you.\n\n\
             First, what role or position are you interviewing for?"
        ),
        system_prompt: collector_prompt(marker),
        model_provider: MODEL_PROVIDER.to_string(),
        model: MODEL.to_string(),
    }
}

fn collector_prompt(marker: &str) -> String {
    format!(
        r#"You are an AI assistant helping create a personalized job interview.

You will ask the user for:
1. Their desired role/position
2. Their experience level (Junior, Mid-level, Senior)
3. Their tech stack or skills
4. The type of interview they want (Technical, Behavioral, or Mixed)
5. How many questions they want (5-15)

Be conversational and helpful. Ask one question at a time and wait for their response.

CRITICAL: After collecting all information, your FINAL message must be ONLY this exact format:

{marker} {{"type": "technical", "role": "Frontend Developer", "level": "junior", "techstack": "React, TypeScript", "amount": 10}}

Examples of correct final messages:
- {marker} {{"type": "mixed", "role": "Backend Developer", "level": "senior", "techstack": "Node.js, MongoDB", "amount": 12}}
- {marker} {{"type": "behavioral", "role": "Product Manager", "level": "mid", "techstack": "Agile, Scrum", "amount": 8}}

DO NOT add any other text, explanations, or thank you messages. ONLY output the {marker} line."#
    )
}

/// Assistant that runs a prepared interview from the `{{questions}}` variable.
pub fn interviewer_assistant() -> AssistantConfig {
    AssistantConfig {
        name: "Interviewer".to_string(),
        first_message: "Hello {{username}}! Thank you for taking the time to speak with me today. \
                        I'm excited to learn more about you and your experience."
            .to_string(),
        system_prompt: r#"You are a professional job interviewer conducting a real-time voice interview with a candidate.

Follow the structured question flow:
{{questions}}

Listen actively, acknowledge answers briefly, and ask short follow-up questions when a response is vague.
Keep responses short and conversational, as in a real voice interview.
Be professional, warm, and welcoming. Do not reveal evaluation criteria.
When all questions are covered, thank the candidate and end the conversation politely."#
            .to_string(),
        model_provider: MODEL_PROVIDER.to_string(),
        model: MODEL.to_string(),
    }
}

/// Renders interview questions as `- question` lines.
pub fn format_questions(questions: &[String]) -> String {
    questions
        .iter()
        .map(|q| format!("- {q}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Template variables for a collector call.
pub fn collector_variables(user_name: &str, user_id: &str) -> CallVariables {
    CallVariables::new()
        .with("username", user_name)
        .with("userid", user_id)
}

/// Template variables for an interviewer call.
pub fn interviewer_variables(user_name: &str, user_id: &str, questions: &[String]) -> CallVariables {
    collector_variables(user_name, user_id).with("questions", format_questions(questions))
}
