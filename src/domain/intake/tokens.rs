//! Reply-token rules.
//!
//! Fixed vocabularies recognised regardless of which field is being asked:
//! cancellation, yes/no answers for confirmation stages, and the heuristic
//! that spots a fresh command typed in the middle of a flow.

/// Inputs that abort the entire flow.
pub const CANCEL_TOKENS: &[&str] = &["cancel", "quit", "exit"];

/// Answers accepted as "yes" in confirmation stages.
pub const AFFIRMATIVE_TOKENS: &[&str] = &["yes", "y", "start", "begin", "add", "more", "1"];

/// Answers accepted as "no" in confirmation stages.
pub const NEGATIVE_TOKENS: &[&str] = &["no", "n", "skip", "done", "finish", "2"];

/// Action verbs (and phrases) that start a new top-level command.
pub const COMMAND_KEYWORDS: &[&str] = &[
    "create", "make", "add", "new", "list", "show", "display", "get", "find", "search",
    "update", "change", "modify", "edit", "set", "delete", "remove",
    "help", "back", "main menu", "start over", "restart", "nevermind", "stop",
];

/// Leading phrases that always denote a listing command.
const LISTING_PREFIXES: &[&str] = &["show all", "list all", "display all"];

fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Returns true if the input exactly matches a cancellation token.
pub fn is_cancel(input: &str) -> bool {
    let input = normalize(input);
    CANCEL_TOKENS.contains(&input.as_str())
}

/// Returns true if the input is an affirmative confirmation.
pub fn is_affirmative(input: &str) -> bool {
    let input = normalize(input);
    AFFIRMATIVE_TOKENS.contains(&input.as_str())
}

/// Returns true if the input is a yes/no style answer.
pub fn is_confirmation_answer(input: &str) -> bool {
    let input = normalize(input);
    AFFIRMATIVE_TOKENS.contains(&input.as_str()) || NEGATIVE_TOKENS.contains(&input.as_str())
}

/// Heuristic for "the user typed a new command rather than an answer".
///
/// Matches when the input starts with a command keyword or contains one as
/// a whole whitespace-delimited token. Multi-word keywords match as
/// consecutive tokens. Substrings inside longer words never match.
pub fn looks_like_new_command(input: &str) -> bool {
    let input = normalize(input);
    if LISTING_PREFIXES.iter().any(|p| input.starts_with(p)) {
        return true;
    }

    let tokens: Vec<&str> = input
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .collect();

    COMMAND_KEYWORDS.iter().any(|keyword| {
        let words: Vec<&str> = keyword.split(' ').collect();
        tokens.windows(words.len()).any(|window| window == words.as_slice())
    })
}
