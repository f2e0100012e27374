//! Prompt composition.
//!
//! Stateless template selection keyed by the query analysis. Every template
//! restricts the model to the given context, names the fallback phrasing
//! for insufficient information, and requires citation by source number.
//! A reasoning block and a formatting block are appended to whichever
//! template was selected.

use super::analyzer::{Intent, QueryAnalysis};

const EXPLANATORY_TEMPLATE: &str = "You are a helpful assistant that explains document content to the user.

Context from documents:
{context}

Question: {question}

Instructions:
1. Answer the question using ONLY the information from the context above.
2. If the context doesn't contain enough information, say so clearly: \"The provided documents do not contain enough information to answer this.\"
3. Cite the sources you rely on by number (Source 1, Source 2, etc.).
4. Structure the answer in four parts:
   - Summary: one or two sentences answering the question directly
   - Detail: the fuller explanation, grounded in the context
   - Sources: which numbered sources support each point
   - Implication: what this means for the reader, if the context supports it
5. If you're not sure, say \"I'm not certain, but based on the documents...\"";

const ANALYTICAL_TEMPLATE: &str = "You are a helpful assistant that analyzes document content for the user.

Context from documents:
{context}

Question: {question}

Instructions:
1. Answer the question using ONLY the information from the context above.
2. If the context doesn't contain enough information, say so clearly: \"The provided documents do not contain enough information to answer this.\"
3. Cite the sources you rely on by number (Source 1, Source 2, etc.).
4. Read through ALL provided sources before answering and look for relationships between different pieces of information.
5. Connect information from multiple sources where needed, explain each connection, and give the reasoning behind your conclusions.";

const CALCULATIVE_TEMPLATE: &str = "You are a helpful assistant that performs calculations from document content.

Context from documents:
{context}

Question: {question}

Instructions:
1. Answer the question using ONLY the information from the context above.
2. If the context doesn't contain enough information, say so clearly: \"The provided documents do not contain enough information to answer this.\"
3. Cite the sources you rely on by number (Source 1, Source 2, etc.).
4. Identify ALL relevant numbers from the context and extract them clearly before calculating.
5. Perform the calculation step by step and show your work, e.g. \"Calculation: (Y / X) * 100 = Z%\".
6. If numbers come from different sources, combine them and say which source each number came from.
7. Verify the arithmetic before giving the final figure.";

const FACTUAL_TEMPLATE: &str = "You are a helpful assistant that answers questions from document content.

Context from documents:
{context}

Question: {question}

Instructions:
1. Answer the question directly using ONLY the information from the context above.
2. If the context doesn't contain enough information, say so clearly: \"The provided documents do not contain enough information to answer this.\"
3. Cite the source of the answer by number (Source 1, Source 2, etc.).
4. Keep the answer short and specific.";

const DEFAULT_TEMPLATE: &str = "You are a helpful assistant that answers questions based on the provided document context.

Context from documents:
{context}

Question: {question}

Instructions:
1. Answer the question using ONLY the information from the context above.
2. If the context doesn't contain enough information, say so clearly: \"The provided documents do not contain enough information to answer this.\"
3. Be specific and cite which source (Source 1, Source 2, etc.) you're using.
4. If you're not sure, say \"I'm not certain, but based on the documents...\"";

const REASONING_BLOCK: &str = "
Before answering, think through which sources are relevant, what they say, and how they fit together. Do not include the deliberation itself in the answer, only its result.";

const RICH_FORMATTING_BLOCK: &str = "
Format the answer with short headers and bullet points so each part is easy to follow.

Answer:";

const TERSE_FORMATTING_BLOCK: &str = "
Format the answer as a few terse bullet points.

Answer:";

/// Select and render the instruction template for a question.
pub fn compose(question: &str, context: &str, analysis: &QueryAnalysis) -> String {
    let template = select_template(analysis);

    let mut prompt = template
        .replace("{context}", context)
        .replace("{question}", question);
    prompt.push_str(REASONING_BLOCK);
    prompt.push_str(if analysis.needs_explanation {
        RICH_FORMATTING_BLOCK
    } else {
        TERSE_FORMATTING_BLOCK
    });
    prompt
}

/// Prompt for the no-retrieval fallback: answer from general knowledge,
/// clearly caveated as not drawn from the user's documents.
pub fn compose_general_fallback(question: &str, key_terms: &[String]) -> String {
    format!(
        "No uploaded document contains information relevant to this question.

Question: {question}

Key terms: {terms}

Answer the question from general knowledge. Start the answer by stating that \
nothing in the uploaded documents covers this, so the following is general \
background rather than information from the user's documents. Keep the answer \
brief and do not invent citations.",
        question = question,
        terms = key_terms.join(", ")
    )
}

fn select_template(analysis: &QueryAnalysis) -> &'static str {
    if analysis.intent == Intent::Explanatory || analysis.needs_explanation {
        EXPLANATORY_TEMPLATE
    } else {
        match analysis.intent {
            Intent::Analytical => ANALYTICAL_TEMPLATE,
            Intent::Calculative => CALCULATIVE_TEMPLATE,
            Intent::Factual => FACTUAL_TEMPLATE,
            _ => DEFAULT_TEMPLATE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::analyzer::{QuestionType, UserLevel};

    fn analysis(intent: Intent, needs_explanation: bool) -> QueryAnalysis {
        QueryAnalysis {
            question_type: QuestionType::Unknown,
            intent,
            user_level: UserLevel::Intermediate,
            is_confused: false,
            needs_explanation,
            key_terms: vec![],
        }
    }

    #[test]
    fn needs_explanation_selects_explanatory_template() {
        let prompt = compose("q", "ctx", &analysis(Intent::Calculative, true));
        assert!(prompt.contains("Summary: one or two sentences"));
        assert!(prompt.contains("headers and bullet points"));
    }

    #[test]
    fn calculative_template_requires_shown_work() {
        let prompt = compose("q", "ctx", &analysis(Intent::Calculative, false));
        assert!(prompt.contains("step by step"));
        assert!(prompt.contains("show your work"));
        assert!(prompt.contains("terse bullet points"));
    }

    #[test]
    fn unknown_intent_falls_back_to_default_template() {
        let prompt = compose("q", "ctx", &analysis(Intent::Unknown, false));
        assert!(prompt.contains("based on the provided document context"));
    }

    #[test]
    fn question_and_context_are_substituted() {
        let prompt = compose(
            "What about penalties?",
            "=== Document: a.txt ===",
            &analysis(Intent::Factual, false),
        );
        assert!(prompt.contains("Question: What about penalties?"));
        assert!(prompt.contains("=== Document: a.txt ==="));
        assert!(!prompt.contains("{context}"));
        assert!(!prompt.contains("{question}"));
    }

    #[test]
    fn every_template_keeps_the_context_only_rule() {
        for (intent, needs) in [
            (Intent::Explanatory, true),
            (Intent::Analytical, false),
            (Intent::Calculative, false),
            (Intent::Factual, false),
            (Intent::Unknown, false),
        ] {
            let prompt = compose("q", "ctx", &analysis(intent, needs));
            assert!(prompt.contains("ONLY the information from the context"));
            assert!(prompt.contains("do not contain enough information"));
            assert!(prompt.contains("Source 1, Source 2"));
        }
    }

    #[test]
    fn fallback_prompt_carries_caveat_and_terms() {
        let prompt = compose_general_fallback(
            "What is EBITDA?",
            &["ebitda".to_string(), "earnings".to_string()],
        );
        assert!(prompt.contains("general background"));
        assert!(prompt.contains("ebitda, earnings"));
    }
}
