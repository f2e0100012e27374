//! Query analysis: classifies a question's surface form and extracts key
//! terms. Pure string processing, no side effects, no network calls.

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    What,
    Why,
    How,
    When,
    Where,
    Who,
    Which,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Factual,
    Explanatory,
    Analytical,
    Calculative,
    Comparative,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserLevel {
    Beginner,
    Intermediate,
    Expert,
}

/// Per-request analysis of a question. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct QueryAnalysis {
    pub question_type: QuestionType,
    pub intent: Intent,
    pub user_level: UserLevel,
    pub is_confused: bool,
    pub needs_explanation: bool,
    pub key_terms: Vec<String>,
}

impl QueryAnalysis {
    /// Complex questions widen retrieval and lower sampling temperature.
    pub fn is_complex(&self) -> bool {
        self.needs_explanation
            || matches!(
                self.intent,
                Intent::Analytical | Intent::Explanatory | Intent::Calculative
            )
            || matches!(self.question_type, QuestionType::Why | QuestionType::How)
    }
}

// Intent keyword sets overlap ("compare" is both analytical and comparative),
// so the order of checking is significant.
const INTENT_KEYWORDS: [(Intent, &[&str]); 5] = [
    (
        Intent::Explanatory,
        &[
            "explain",
            "explanation",
            "understand",
            "meaning",
            "define",
            "definition",
            "what is",
            "what does",
            "tell me about",
            "help me understand",
        ],
    ),
    (
        Intent::Analytical,
        &[
            "analyze",
            "analysis",
            "compare",
            "comparison",
            "relationship",
            "correlation",
            "impact",
            "effect",
            "influence",
            "trend",
            "pattern",
        ],
    ),
    (
        Intent::Calculative,
        &[
            "calculate", "compute", "ratio", "percentage", "margin", "profit", "revenue",
            "divide", "multiply", "sum", "total", "average",
        ],
    ),
    (
        Intent::Comparative,
        &[
            "compare",
            "comparison",
            "versus",
            "vs",
            "difference",
            "similar",
            "better",
            "worse",
            "more than",
            "less than",
        ],
    ),
    (
        Intent::Factual,
        &["what", "who", "when", "where", "which", "list", "name", "show"],
    ),
];

const CONFUSION_INDICATORS: &[&str] = &[
    "confused",
    "confusing",
    "don't understand",
    "don't know",
    "not clear",
    "unclear",
    "can't understand",
    "doesn't make sense",
    "help",
    "clarify",
    "simplify",
];

const BEGINNER_INDICATORS: &[&str] = &[
    "what is",
    "what does",
    "basics",
    "simple",
    "easy",
    "beginner",
    "introduction",
    "overview",
    "summary",
    "in simple terms",
    "layman",
];

const EXPERT_INDICATORS: &[&str] = &[
    "implementation",
    "architecture",
    "optimization",
    "algorithm",
    "methodology",
    "framework",
    "paradigm",
];

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "should", "could", "may", "might", "must", "can",
    "this", "that", "these", "those", "i", "you", "he", "she", "it", "we", "they", "what",
    "which", "who", "when", "where", "why", "how", "and", "or", "but", "if", "then", "else",
];

const MAX_KEY_TERMS: usize = 5;
const MAX_QUERY_VARIANTS: usize = 3;

pub struct QueryAnalyzer {
    question_patterns: Vec<(QuestionType, Regex)>,
    word: Regex,
    what_is: Regex,
    how_to: Regex,
}

impl QueryAnalyzer {
    pub fn new() -> Self {
        // First match wins, so the order here is part of the contract.
        let question_patterns = [
            (QuestionType::What, r"\b(what|what is|what are|what does|what do|what's)\b"),
            (QuestionType::Why, r"\b(why|why is|why are|why does|why do)\b"),
            (QuestionType::How, r"\b(how|how is|how are|how does|how do|how to|how can)\b"),
            (QuestionType::When, r"\b(when|when is|when are|when does|when do)\b"),
            (QuestionType::Where, r"\b(where|where is|where are|where does|where do)\b"),
            (QuestionType::Who, r"\b(who|who is|who are|who does|who do)\b"),
            (QuestionType::Which, r"\b(which|which is|which are|which does|which do)\b"),
        ]
        .into_iter()
        .map(|(kind, pattern)| (kind, Regex::new(pattern).expect("question pattern is valid")))
        .collect();

        Self {
            question_patterns,
            word: Regex::new(r"\b\w+\b").expect("word pattern is valid"),
            what_is: Regex::new(r"what (?:is|does) (.+?)(?:\?|$)").expect("pattern is valid"),
            how_to: Regex::new(r"how (?:to|do) (.+?)(?:\?|$)").expect("pattern is valid"),
        }
    }

    pub fn analyze(&self, question: &str) -> QueryAnalysis {
        let lowered = question.to_lowercase().trim().to_string();

        let question_type = self.detect_question_type(&lowered);
        let intent = detect_intent(&lowered);
        let user_level = detect_user_level(&lowered);
        let is_confused = CONFUSION_INDICATORS.iter().any(|ind| lowered.contains(ind));

        let needs_explanation = matches!(intent, Intent::Explanatory | Intent::Analytical)
            || matches!(
                question_type,
                QuestionType::What | QuestionType::Why | QuestionType::How
            )
            || is_confused
            || user_level == UserLevel::Beginner;

        QueryAnalysis {
            question_type,
            intent,
            user_level,
            is_confused,
            needs_explanation,
            key_terms: self.extract_key_terms(&lowered),
        }
    }

    /// Alternate phrasings for retrieval, original question first.
    pub fn expand_query(&self, question: &str) -> Vec<String> {
        let mut variants = vec![question.to_string()];
        let lowered = question.to_lowercase();

        if let Some(caps) = self.what_is.captures(&lowered) {
            let term = caps[1].trim().to_string();
            variants.extend([
                format!("{} definition", term),
                format!("{} meaning", term),
                format!("explain {}", term),
                format!("what is {}", term),
            ]);
        }

        if let Some(caps) = self.how_to.captures(&lowered) {
            let term = caps[1].trim().to_string();
            variants.extend([
                format!("{} method", term),
                format!("{} process", term),
                format!("{} steps", term),
                format!("how {} works", term),
            ]);
        }

        variants.truncate(MAX_QUERY_VARIANTS);
        variants
    }

    fn detect_question_type(&self, question: &str) -> QuestionType {
        for (kind, pattern) in &self.question_patterns {
            if pattern.is_match(question) {
                return *kind;
            }
        }
        QuestionType::Unknown
    }

    fn extract_key_terms(&self, question: &str) -> Vec<String> {
        let mut terms = Vec::new();
        for token in self.word.find_iter(question) {
            let token = token.as_str();
            if token.chars().count() <= 2 || STOP_WORDS.contains(&token) {
                continue;
            }
            if !terms.iter().any(|seen| seen == token) {
                terms.push(token.to_string());
            }
            if terms.len() == MAX_KEY_TERMS {
                break;
            }
        }
        terms
    }
}

impl Default for QueryAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn detect_intent(question: &str) -> Intent {
    for (intent, keywords) in &INTENT_KEYWORDS {
        if keywords.iter().any(|kw| question.contains(kw)) {
            return *intent;
        }
    }
    Intent::Unknown
}

fn detect_user_level(question: &str) -> UserLevel {
    if BEGINNER_INDICATORS.iter().any(|ind| question.contains(ind)) {
        return UserLevel::Beginner;
    }
    if EXPERT_INDICATORS.iter().any(|ind| question.contains(ind)) {
        return UserLevel::Expert;
    }
    UserLevel::Intermediate
}
