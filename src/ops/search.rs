use regex::{Regex, RegexBuilder};

use crate::model::task::Task;

/// Case-insensitive substring matcher over task titles.
///
/// The search text is matched literally (regex metacharacters are escaped)
/// with Unicode case folding, so `"CAFÉ"` finds `"café au lait"`.
#[derive(Debug, Clone)]
pub struct TitleFilter {
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    All,
    Regex(Regex),
    /// Used if the pattern blows the regex size limit
    Lowercase(String),
}

impl TitleFilter {
    /// Build a filter for `search_text`. Empty text matches everything.
    pub fn new(search_text: &str) -> Self {
        let matcher = if search_text.is_empty() {
            Matcher::All
        } else {
            match RegexBuilder::new(&regex::escape(search_text))
                .case_insensitive(true)
                .build()
            {
                Ok(re) => Matcher::Regex(re),
                Err(_) => Matcher::Lowercase(search_text.to_lowercase()),
            }
        };
        TitleFilter { matcher }
    }

    /// True when the filter lets everything through
    pub fn is_empty(&self) -> bool {
        matches!(self.matcher, Matcher::All)
    }

    pub fn matches(&self, task: &Task) -> bool {
        match &self.matcher {
            Matcher::All => true,
            Matcher::Regex(re) => re.is_match(&task.title),
            Matcher::Lowercase(needle) => task.title.to_lowercase().contains(needle.as_str()),
        }
    }
}

/// Tasks whose title contains `search_text`, in their original order
pub fn filter_tasks<'a>(tasks: &'a [Task], search_text: &str) -> Vec<&'a Task> {
    let filter = TitleFilter::new(search_text);
    tasks.iter().filter(|t| filter.matches(t)).collect()
}

/// Indices into `tasks` of the entries `filter_tasks` would return
pub fn filtered_indices(tasks: &[Task], search_text: &str) -> Vec<usize> {
    let filter = TitleFilter::new(search_text);
    tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| filter.matches(t))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Priority;

    fn titles(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.title.clone()).collect()
    }

    fn sample() -> Vec<Task> {
        ["Buy milk", "Call MOM", "buy bread", "Café au lait", "1+1=2 (math)"]
            .iter()
            .map(|t| Task::new(*t, Priority::Medium, "Personal"))
            .collect()
    }

    #[test]
    fn empty_search_returns_everything_in_order() {
        let tasks = sample();
        let all = filter_tasks(&tasks, "");
        assert_eq!(all.len(), tasks.len());
        for (a, b) in all.iter().zip(tasks.iter()) {
            assert_eq!(a.id, b.id);
        }
        assert!(TitleFilter::new("").is_empty());
    }

    #[test]
    fn matches_case_insensitively() {
        let tasks = sample();
        assert_eq!(titles(&filter_tasks(&tasks, "BUY")), vec!["Buy milk", "buy bread"]);
        assert_eq!(titles(&filter_tasks(&tasks, "mom")), vec!["Call MOM"]);
    }

    #[test]
    fn matches_non_ascii_case() {
        let tasks = sample();
        assert_eq!(titles(&filter_tasks(&tasks, "CAFÉ")), vec!["Café au lait"]);
    }

    #[test]
    fn metacharacters_are_literal() {
        let tasks = sample();
        assert_eq!(titles(&filter_tasks(&tasks, "1+1")), vec!["1+1=2 (math)"]);
        assert_eq!(titles(&filter_tasks(&tasks, "(math)")), vec!["1+1=2 (math)"]);
        assert!(filter_tasks(&tasks, ".*").is_empty());
    }

    #[test]
    fn no_match_is_empty() {
        let tasks = sample();
        assert!(filter_tasks(&tasks, "groceries").is_empty());
    }

    #[test]
    fn indices_line_up_with_filter() {
        let tasks = sample();
        assert_eq!(filtered_indices(&tasks, "buy"), vec![0, 2]);
        assert_eq!(filtered_indices(&tasks, ""), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn whitespace_is_significant() {
        let tasks = sample();
        assert_eq!(titles(&filter_tasks(&tasks, "y m")), vec!["Buy milk"]);
        assert!(filter_tasks(&tasks, "  ").is_empty());
    }
}
