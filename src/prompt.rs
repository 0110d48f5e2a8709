//! Task descriptions for the generation service.

/// Build the default task for explaining a practice question.
///
/// The context sentence is omitted when no explanation is available.
pub fn explain_question_prompt(
    question: &str,
    correct_answer: &str,
    explanation: Option<&str>,
) -> String {
    let mut prompt = format!(
        "Explain how to solve this SAT math question: {}. The correct answer is {}.",
        question.trim(),
        correct_answer.trim()
    );

    if let Some(context) = explanation.map(str::trim).filter(|e| !e.is_empty()) {
        prompt.push_str(" Additional context: ");
        prompt.push_str(context);
    }

    prompt
}

/// First `max_chars` characters of `text`, with an ellipsis when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
