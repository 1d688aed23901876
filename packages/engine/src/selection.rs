//! Candidate collection and the shortest-candidate selection policy.
//!
//! Patterns are usually written loosely (a label followed by whatever
//! comes after it), so when a pattern matches several times, or captures
//! several groups, the shortest non-blank candidate is taken as the value.
//! This is a heuristic: two distinct real values in one document (two
//! dates, say) resolve to whichever is shorter.

use regex::Regex;

/// Collects the raw candidates of every non-overlapping match of `regex`
/// in `text`, in match order.
///
/// For each match, every capture group that participated contributes a
/// candidate, including groups that matched the empty string. A match in
/// which no group participated (or a regex without groups) contributes its
/// whole matched text instead.
#[must_use]
pub fn candidates<'t>(regex: &Regex, text: &'t str) -> Vec<&'t str> {
    let mut found = Vec::new();

    for caps in regex.captures_iter(text) {
        let before = found.len();
        found.extend(caps.iter().skip(1).flatten().map(|m| m.as_str()));

        if found.len() == before {
            found.push(caps.get(0).map_or("", |m| m.as_str()));
        }
    }

    found
}

/// Whether `c` is stripped from the ends of a candidate: Unicode
/// whitespace plus the ASCII file, group, record and unit separators
/// (U+001C to U+001F), which PDF text extraction sometimes leaves behind.
fn is_padding(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\x1c'..='\x1f')
}

/// Trims whitespace and separator control characters from both ends.
#[must_use]
pub fn trim_candidate(candidate: &str) -> &str {
    candidate.trim_matches(is_padding)
}

/// Picks the shortest candidate after trimming it with [`trim_candidate`].
///
/// Candidates that are blank after trimming are ignored. Length is counted
/// in characters and ties go to the earliest candidate. Returns `None` when
/// nothing is left.
#[must_use]
pub fn shortest<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .map(trim_candidate)
        .filter(|c| !c.is_empty())
        .min_by_key(|c| c.chars().count())
}

/// Applies the full selection policy of one field to `text`.
#[must_use]
pub fn select_value(regex: &Regex, text: &str) -> Option<String> {
    shortest(candidates(regex, text)).map(str::to_owned)
}
