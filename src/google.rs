//! "Google-style" search string tokenizer.
//!
//! Grammar:
//!   word1 word2     -->  must contain both word1 and word2
//!   word1 OR word2  -->  must contain either word1 or word2
//!   "word1 word2"   -->  must contain the exact phrase
//!   -word1          -->  must not contain word1
//!
//! To conform to google, "OR" is greedy: `word1 word2 OR word3 word4` means
//! word1 AND (word2 OR word3) AND word4.  Negated assertions may not take
//! OR clauses.
use crate::result::{QueryError, QueryResult};
use crate::util::strip_squeeze;
use regex::Regex;
use std::sync::OnceLock;

/// Result of parsing: each entry of `goods` is a set of alternatives, at
/// least one of which must match; every entry of `bads` must not match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoogleSearch {
    pub goods: Vec<Vec<String>>,
    pub bads: Vec<String>,
}

impl GoogleSearch {
    pub fn is_blank(&self) -> bool {
        self.goods.is_empty() && self.bads.is_empty()
    }
}

fn regexes() -> &'static (Regex, Regex, Regex, Regex) {
    static RE: OnceLock<(Regex, Regex, Regex, Regex)> = OnceLock::new();
    RE.get_or_init(|| {
        (
            // -"phrase" or -word at the head of the string
            Regex::new(r#"^-"([^"]+)"( |$)"#).unwrap(),
            Regex::new(r#"^-(\S+)( |$)"#).unwrap(),
            // a full OR group at the head of the string
            Regex::new(r#"^(("[^"]+"|\S+)( OR ("[^"]+"|\S+))*)( |$)"#).unwrap(),
            // one alternative within an OR group
            Regex::new(r#"^(?:"([^"]+)"|(\S+))( OR |$)"#).unwrap(),
        )
    })
}

/// Tokenize a search string.  Returns an error on stray syntax (e.g. an
/// unterminated quote) rather than guessing.
///
/// ```
/// let search = mo_query::google::parse("agaricus OR amanita -amanitarita").unwrap();
/// assert_eq!(search.goods, vec![vec!["agaricus".to_string(), "amanita".to_string()]]);
/// assert_eq!(search.bads, vec!["amanitarita".to_string()]);
/// ```
pub fn parse(pattern: &str) -> QueryResult<GoogleSearch> {
    let (bad_phrase, bad_word, good_group, good_alt) = regexes();

    let mut search = GoogleSearch::default();
    let mut rest = strip_squeeze(pattern);

    while !rest.is_empty() {
        if let Some(caps) = bad_phrase.captures(&rest) {
            search.bads.push(caps[1].to_string());
            rest = rest[caps[0].len()..].to_string();
        } else if let Some(caps) = bad_word.captures(&rest) {
            search.bads.push(caps[1].to_string());
            rest = rest[caps[0].len()..].to_string();
        } else if let Some(caps) = good_group.captures(&rest) {
            let mut group = caps[1].to_string();
            rest = rest[caps[0].len()..].to_string();

            let mut alts = Vec::new();
            while let Some(c2) = good_alt.captures(&group) {
                // One of the two branches always captures.
                let alt = c2.get(1).or_else(|| c2.get(2)).unwrap().as_str();
                alts.push(alt.to_string());
                group = group[c2[0].len()..].to_string();
            }
            search.goods.push(alts);
        } else {
            return Err(QueryError::Message(format!(
                "Invalid search string syntax at: '{rest}'"
            )));
        }
    }

    Ok(search)
}

/// Prepare a token for use inside a bound `LIKE '%...%'` value: escape the
/// LIKE metacharacters and translate user-facing `*` wildcards.
pub fn clean_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '%' => out.push_str("\\%"),
            '_' => out.push_str("\\_"),
            '*' => out.push('%'),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_words_are_anded() {
        let s = parse("one two three").unwrap();
        assert_eq!(s.goods.len(), 3);
        assert!(s.bads.is_empty());
    }

    #[test]
    fn greedy_or() {
        let s = parse("word1 word2 OR word3 word4").unwrap();
        assert_eq!(
            s.goods,
            vec![
                vec!["word1".to_string()],
                vec!["word2".to_string(), "word3".to_string()],
                vec!["word4".to_string()],
            ]
        );
    }

    #[test]
    fn quoted_phrases() {
        let s = parse(r#""one two" -"three four""#).unwrap();
        assert_eq!(s.goods, vec![vec!["one two".to_string()]]);
        assert_eq!(s.bads, vec!["three four".to_string()]);
    }

    #[test]
    fn blank_input() {
        assert!(parse("").unwrap().is_blank());
        assert!(parse("   ").unwrap().is_blank());
    }

    #[test]
    fn like_escaping() {
        assert_eq!(clean_pattern("50%_a*b\\"), "50\\%\\_a%b\\\\");
    }
}
