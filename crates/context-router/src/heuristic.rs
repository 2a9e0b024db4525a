use regex::Regex;

const MULTI_PROJECT_KEYWORDS: &[&str] = &[
    "compare",
    "across",
    "all projects",
    " vs ",
    " vs. ",
    "versus",
    "difference between",
    "both projects",
];

const SINGLE_PROJECT_INDICATORS: &[&str] = &["this project", "current project", "here"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryClass {
    SingleProject,
    MultiProject,
    General,
}

#[derive(Debug, Clone)]
pub struct Classification {
    pub class: QueryClass,
    pub confidence: f32,
    pub mentioned_projects: Vec<String>,
}

/// Classifies a query into `SINGLE_PROJECT` / `MULTI_PROJECT` / `GENERAL`
/// using lightweight, explainable features rather than a model call, so
/// the common case never pays for an LLM round trip. Name matching is
/// case-insensitive and word-bounded: `api` must not match inside
/// `apiHelper`.
pub fn classify(query: &str, known_project_names: &[String]) -> Classification {
    let lower = query.to_lowercase();

    let mentioned: Vec<String> = known_project_names
        .iter()
        .filter(|name| mentions_project(&lower, name))
        .cloned()
        .collect();

    let has_multi_keyword = MULTI_PROJECT_KEYWORDS.iter().any(|kw| lower.contains(kw));
    let has_single_indicator = SINGLE_PROJECT_INDICATORS.iter().any(|kw| lower.contains(kw));

    let (class, confidence) = if mentioned.len() >= 2 {
        (QueryClass::MultiProject, 0.95)
    } else if has_multi_keyword && !mentioned.is_empty() {
        (QueryClass::MultiProject, 0.85)
    } else if mentioned.len() == 1 {
        (QueryClass::SingleProject, 0.9)
    } else if has_single_indicator {
        (QueryClass::SingleProject, 0.85)
    } else if has_multi_keyword {
        (QueryClass::General, 0.6)
    } else {
        (QueryClass::General, 0.5)
    };

    Classification {
        class,
        confidence,
        mentioned_projects: mentioned,
    }
}

fn mentions_project(lower_query: &str, name: &str) -> bool {
    let pattern = format!(r"(?i)\b{}\b", regex::escape(name));
    Regex::new(&pattern)
        .map(|re| re.is_match(lower_query))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names() -> Vec<String> {
        vec!["api-service".to_string(), "frontend-app".to_string(), "shared-utils".to_string()]
    }

    #[test]
    fn two_names_is_multi_project_with_high_confidence() {
        let out = classify("Compare api-service and frontend-app", &names());
        assert_eq!(out.class, QueryClass::MultiProject);
        assert!(out.confidence >= 0.85);
        assert_eq!(out.mentioned_projects.len(), 2);
    }

    #[test]
    fn one_name_is_single_project() {
        let out = classify("What does api-service do?", &names());
        assert_eq!(out.class, QueryClass::SingleProject);
        assert_eq!(out.confidence, 0.9);
    }

    #[test]
    fn partial_substring_does_not_match() {
        let out = classify("explain the apiHelper function", &vec!["api".to_string()]);
        assert!(out.mentioned_projects.is_empty());
    }

    #[test]
    fn empty_query_is_general_with_moderate_confidence() {
        let out = classify("", &names());
        assert_eq!(out.class, QueryClass::General);
        assert!(out.confidence <= 0.7);
    }

    #[test]
    fn single_project_indicator_without_name_is_single_project() {
        let out = classify("what does this project do", &names());
        assert_eq!(out.class, QueryClass::SingleProject);
        assert_eq!(out.confidence, 0.85);
    }

    #[test]
    fn multi_keyword_alone_is_weak_general() {
        let out = classify("compare these approaches", &names());
        assert_eq!(out.class, QueryClass::General);
        assert_eq!(out.confidence, 0.6);
    }
}
