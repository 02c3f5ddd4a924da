/// Mention parsing for comment text
///
/// A mention is `@` followed by one or more word characters
/// (`[A-Za-z0-9_]`). Handles are returned deduplicated, in order of first
/// appearance; resolving them to users is the store's job.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

fn mention_regex() -> &'static Regex {
    static MENTION: OnceLock<Regex> = OnceLock::new();
    MENTION.get_or_init(|| Regex::new(r"@([A-Za-z0-9_]+)").expect("mention pattern is valid"))
}

fn username_regex() -> &'static Regex {
    static USERNAME: OnceLock<Regex> = OnceLock::new();
    USERNAME.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("username pattern is valid"))
}

/// Extracts unique `@handle` tokens from `content`
///
/// # Example
///
/// ```
/// use taskflow_shared::mentions::extract_mentions;
///
/// let handles = extract_mentions("ping @alice and @bob, thanks @alice!");
/// assert_eq!(handles, vec!["alice", "bob"]);
/// ```
pub fn extract_mentions(content: &str) -> Vec<&str> {
    let mut seen = HashSet::new();
    mention_regex()
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|handle| seen.insert(*handle))
        .collect()
}

/// Whether `username` can be the target of a mention
pub fn is_mentionable_username(username: &str) -> bool {
    username_regex().is_match(username)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_mentions() {
        assert!(extract_mentions("plain text, no handles").is_empty());
        assert!(extract_mentions("a lone @ sign").is_empty());
    }

    #[test]
    fn test_mentions_stop_at_non_word_chars() {
        assert_eq!(extract_mentions("hello @alice."), vec!["alice"]);
        assert_eq!(extract_mentions("@dev-ops"), vec!["dev"]);
        assert_eq!(extract_mentions("(@x_1)"), vec!["x_1"]);
    }

    #[test]
    fn test_username_rules() {
        assert!(is_mentionable_username("alice_99"));
        assert!(!is_mentionable_username("alice smith"));
        assert!(!is_mentionable_username("al.ice"));
        assert!(!is_mentionable_username(""));
    }
}
