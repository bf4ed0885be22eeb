//! Prompt library for the two mentor personas
//!
//! The tutor persona handles questions, code explanation, review, debugging,
//! comparisons and resource recommendations. The planner persona produces and
//! revises learning paths.

/// System instructions for the technical tutor
pub const TUTOR_SYSTEM_PROMPT: &str = r#"You are an experienced programming mentor who answers technical questions for learners.

How you answer:
- Explain why, not only what
- Include short, commented code examples where they help
- Point out common pitfalls and recommended practice
- Suggest where to read further
- Match the depth of the answer to the learner's level

Structure longer answers as:
1. One-sentence summary
2. Detailed explanation
3. Code example (if relevant)
4. When to use it
5. Pitfalls
6. Best practices
7. Further reading

If the question is ambiguous, say what you are assuming. When several solutions exist, compare their trade-offs. Encourage the learner to try things hands-on."#;

/// System instructions for the learning-path planner
pub const PLANNER_SYSTEM_PROMPT: &str = r#"You are a technical learning coach who designs personalised study plans.

Your job:
1. Assess where the learner is today
2. Understand their goal and the time they can commit
3. Build a plan that progresses step by step
4. Break large goals into small, concrete tasks
5. Recommend high-quality resources

Plans you write always:
- Move from fundamentals to advanced topics
- Mix theory with practice
- Give every stage a clear objective and a way to check it was reached
- Name specific resources (documentation, tutorials, projects)
- Estimate the time each stage needs
- Suggest hands-on projects

Organise the plan into beginner, intermediate and advanced stages, each with topics, resources, a project, a time estimate and completion criteria."#;

pub fn question_prompt(question: &str, context: Option<&str>, user_level: &str) -> String {
    let mut prompt = format!("Question: {}\n\n", question);
    if let Some(context) = non_blank(context) {
        prompt.push_str(&format!("Context: {}\n\n", context));
    }
    prompt.push_str(&format!("Learner level: {}\n\n", user_level));
    prompt.push_str("Give a thorough answer with an explanation, code examples and best practices.");
    prompt
}

pub fn explain_code_prompt(code: &str, language: &str, specific_question: Option<&str>) -> String {
    let mut prompt = format!(
        "Explain the following {lang} code:\n\n```{lang}\n{code}\n```\n\n",
        lang = language,
        code = code
    );
    if let Some(q) = non_blank(specific_question) {
        prompt.push_str(&format!("Specific question: {}\n\n", q));
    }
    prompt.push_str(
        "Cover:\n\
         1. What the code does overall\n\
         2. A block-by-block walkthrough\n\
         3. The key concepts involved\n\
         4. Potential problems or improvements\n\
         5. Related topics worth learning",
    );
    prompt
}

pub fn review_code_prompt(code: &str, language: &str, context: Option<&str>) -> String {
    let mut prompt = format!("Review the following {} code and suggest improvements.\n\n", language);
    if let Some(context) = non_blank(context) {
        prompt.push_str(&format!("Purpose of the code: {}\n\n", context));
    }
    prompt.push_str(&format!("```{}\n{}\n```\n\n", language, code));
    prompt.push_str(
        "Assess:\n\
         1. Readability and maintainability\n\
         2. Performance\n\
         3. Security\n\
         4. Best practices\n\
         5. Error handling\n\
         6. Style\n\n\
         Where you suggest changes, show the improved code.",
    );
    prompt
}

pub fn debug_prompt(code: &str, error: &str, expected: &str, actual: &str) -> String {
    format!(
        "Help debug this problem.\n\n\
         Code:\n```\n{code}\n```\n\n\
         Error:\n{error}\n\n\
         Expected behaviour: {expected}\n\
         Actual behaviour: {actual}\n\n\
         Provide:\n\
         1. The root cause\n\
         2. A fix\n\
         3. The corrected code\n\
         4. How to avoid this class of bug\n\
         5. Debugging techniques that would have found it",
        code = code,
        error = error,
        expected = or_unspecified(expected),
        actual = or_unspecified(actual),
    )
}

pub fn compare_prompt(concept1: &str, concept2: &str, context: Option<&str>) -> String {
    let mut prompt = format!(
        "Compare these two concepts in detail.\n\nConcept 1: {}\nConcept 2: {}\n",
        concept1, concept2
    );
    if let Some(context) = non_blank(context) {
        prompt.push_str(&format!("\nContext: {}\n", context));
    }
    prompt.push_str(
        "\nCompare:\n\
         1. Definitions and the core difference\n\
         2. Use cases\n\
         3. Strengths and weaknesses\n\
         4. Code examples\n\
         5. Performance differences (if any)\n\
         6. How to choose between them\n\
         7. Real-world usage",
    );
    prompt
}

pub fn resources_prompt(topic: &str, user_level: &str, resource_type: &str) -> String {
    format!(
        "Recommend high-quality learning resources for \"{topic}\".\n\n\
         Learner level: {level}\n\
         Preferred resource type: {kind}\n\n\
         Include official documentation, tutorials (articles or videos), books, \
         open-source projects, practice projects and communities.\n\n\
         For each resource give its name and link (if any), the stage it suits, \
         what it covers and why you recommend it.",
        topic = topic,
        level = user_level,
        kind = resource_type,
    )
}

pub fn learning_path_prompt(
    technology: &str,
    current_level: &str,
    goal: &str,
    time_commitment: &str,
) -> String {
    format!(
        "Create a detailed learning path for this learner.\n\n\
         Technology: {technology}\n\
         Current level: {level}\n\
         Goal: {goal}\n\
         Time available: {time}\n\n\
         Include:\n\
         1. A roadmap overview\n\
         2. A stage-by-stage plan\n\
         3. Topics to cover in each stage\n\
         4. Recommended resources (docs, tutorials, videos)\n\
         5. Project ideas\n\
         6. Completion criteria for each stage\n\n\
         Keep the plan realistic for the time available.",
        technology = technology,
        level = current_level,
        goal = goal,
        time = time_commitment,
    )
}

pub fn update_path_prompt(current_path: &str, feedback: &str, progress: &str) -> String {
    format!(
        "Revise this learning path based on the learner's progress and feedback.\n\n\
         Current learning path:\n{path}\n\n\
         Progress: {progress}\n\
         Feedback: {feedback}\n\n\
         Adjust the plan so it fits how the learner is actually doing.",
        path = current_path,
        progress = or_unspecified(progress),
        feedback = feedback,
    )
}

pub fn next_step_prompt(learning_path: &str, completed_topics: &str) -> String {
    format!(
        "Based on the learner's progress, recommend what to study next.\n\n\
         Learning path:\n{path}\n\n\
         Completed topics:\n{done}\n\n\
         Recommend:\n\
         1. The next topic\n\
         2. Why it comes next\n\
         3. Specific resources\n\
         4. Estimated time\n\
         5. A practice exercise",
        path = learning_path,
        done = completed_topics,
    )
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn or_unspecified(value: &str) -> &str {
    if value.trim().is_empty() {
        "not specified"
    } else {
        value
    }
}
