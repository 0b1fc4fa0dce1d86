use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref MENTION: Regex = Regex::new(r"@[a-z0-9]+").expect("mention pattern is valid");
    static ref URL: Regex = Regex::new(r"\w+://\S*|\bhttp\S*").expect("url pattern is valid");
    static ref LEADING_RT: Regex = Regex::new(r"^\s*(?:rt(?:\s+|$))+").expect("retweet pattern is valid");
    static ref NON_ALNUM: Regex = Regex::new(r"[^a-z0-9\s]").expect("character class is valid");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("whitespace pattern is valid");
}

/// Cleans raw post text into the canonical form used by both training and inference.
///
/// Steps, in order:
/// 1. Lowercase
/// 2. Strip `@mentions`
/// 3. Strip URLs (`scheme://...` and bare `http...` tokens)
/// 4. Strip leading `rt` tokens
/// 5. Strip everything that is not an ASCII letter, digit or whitespace
/// 6. Collapse whitespace runs and trim
///
/// The pass is repeated until the text stops changing, so punctuation removal
/// can never expose a new `rt` token or `http` prefix in the returned value.
/// This keeps `normalize(normalize(x)) == normalize(x)` for every input.
///
/// # Example
/// ```
/// use hs_classifier::normalize;
///
/// assert_eq!(normalize("RT @foo: Check http://x.co NOW!!"), "check now");
/// ```
pub fn normalize(text: &str) -> String {
    let mut current = clean_pass(text);
    loop {
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_pass(text: &str) -> String {
    let lowered = text.to_lowercase();
    let without_mentions = MENTION.replace_all(&lowered, "");
    let without_urls = URL.replace_all(&without_mentions, "");
    let without_rt = LEADING_RT.replace(&without_urls, "");
    let alnum_only = NON_ALNUM.replace_all(&without_rt, "");
    WHITESPACE.replace_all(&alnum_only, " ").trim().to_string()
}

/// Reports whether a raw post is addressed to another user (starts with `@`).
pub fn is_mention(text: &str) -> bool {
    text.starts_with('@')
}
