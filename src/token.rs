use once_cell::sync::Lazy;
use regex::Regex;

/// The five-way directive operator (spec §3, §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `$$` — dot-relative schema lookup.
    Relative,
    /// `!!` — absolute schema lookup.
    Absolute,
    /// `^^` — parent-relative schema lookup.
    Parent,
    /// `@@` — template inclusion.
    Include,
    /// `@@!` — template inclusion, dropping the final character.
    IncludeChomp,
    /// `%%` — built-in function call.
    Function,
}

impl Operator {
    fn from_str(s: &str) -> Operator {
        match s {
            "$$" => Operator::Relative,
            "!!" => Operator::Absolute,
            "^^" => Operator::Parent,
            "@@!" => Operator::IncludeChomp,
            "@@" => Operator::Include,
            "%%" => Operator::Function,
            other => unreachable!("regex only matches known operators, got {:?}", other),
        }
    }
}

/// A single parsed directive (spec §3 "Token").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub operator: Operator,
    pub path: Vec<String>,
    pub select: Option<String>,
    pub expansion: Option<String>,
    pub start: usize,
    pub end: usize,
    pub indent: usize,
}

// Longest-operator-wins tie-break: `@@!` must be tried before `@@`. Rust's
// regex crate uses leftmost-first alternation (like Perl), so ordering the
// branches this way is sufficient — no `longest_match` mode needed.
//
// Path segments allow `^^` as a literal component (spec §4.2's "a literal
// segment equal to `^^` within a path pops the last segment"), so the
// character class includes `^` alongside the identifier characters named in
// §4.1 (letters, digits, underscore).
//
// `$$`/`!!`/`^^` can stand bare (no path at all, e.g. `$$` alone resolves to
// the current scope's value per §4.1), so their path is only entered through
// a literal leading `.` — otherwise trailing prose text right after a bare
// operator (`$$ends up ...`) would be misread as a path segment. `@@`/`@@!`/
// `%%` always name something (an include path, a function), and every
// worked example in the spec (§4.4, §4.6, §8) writes that first segment
// directly against the operator with no dot (`@@a.b.c`, `%%git.name`), so
// their leading dot is optional instead of required.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)(?:(\$\$|!!|\^\^)(?:\.([A-Za-z0-9_^]+(?:\.[A-Za-z0-9_^]+)*))?|(@@!|@@|%%)(?:\.?([A-Za-z0-9_^]+(?:\.[A-Za-z0-9_^]+)*))?)(?:\s*\[\[(.*?)\]\])?(?:[ \t]*\{\{(.*?)\}\})?",
    )
    .expect("valid token regex")
});

impl Token {
    /// Finds the next directive in `content`, if any (spec §4.4 step 1).
    pub fn find(content: &str) -> Option<Token> {
        let m = TOKEN_RE.captures(content)?;
        let whole = m.get(0).expect("group 0 always matches");

        let operator_match = m.get(1).or_else(|| m.get(3)).expect("one operator branch always matches");
        let operator = Operator::from_str(operator_match.as_str());

        let path = m
            .get(2)
            .or_else(|| m.get(4))
            .map(|g| g.as_str().split('.').map(String::from).collect())
            .unwrap_or_default();

        let select = m.get(5).map(|g| g.as_str().to_string());

        let mut end = whole.end();
        let (expansion, indent) = match m.get(6) {
            None => (None, 0),
            Some(g) => resolve_expansion(content, g.as_str(), &mut end),
        };

        Some(Token {
            operator,
            path,
            select,
            expansion,
            start: whole.start(),
            end,
            indent,
        })
    }
}

/// Applies the inline-vs-whole-line policy of spec §4.1 to a raw `{{ ... }}`
/// interior, returning the effective expansion body and its indent column.
/// `end` is extended past a trailing newline when the whole-line policy
/// absorbs one.
fn resolve_expansion(content: &str, raw: &str, end: &mut usize) -> (Option<String>, usize) {
    if !raw.contains('\n') {
        // Inline: substituted verbatim, trailing space before `}}` and any
        // trailing newline after `}}` are both preserved untouched.
        let indent = leading_indent(raw);
        return (Some(raw.to_string()), indent);
    }

    // Whole-line: strip the horizontal whitespace + newline run right after
    // `{{`, and the horizontal whitespace run right before `}}`.
    let after_open = {
        let mut idx = 0;
        let bytes = raw.as_bytes();
        while idx < bytes.len() && (bytes[idx] == b' ' || bytes[idx] == b'\t') {
            idx += 1;
        }
        while idx < bytes.len() && bytes[idx] == b'\n' {
            idx += 1;
        }
        &raw[idx..]
    };
    let trimmed = after_open.trim_end_matches([' ', '\t']);
    let indent = leading_indent(trimmed);

    // Absorb a trailing newline after the closing `}}` so the whole-line
    // directive doesn't leave a blank line behind.
    let rest = &content[*end..];
    let mut consumed = 0;
    for ch in rest.chars() {
        if ch == ' ' || ch == '\t' {
            consumed += 1;
            continue;
        }
        if ch == '\n' {
            consumed += 1;
        }
        break;
    }
    if rest[..consumed].ends_with('\n') {
        *end += consumed;
    }

    (Some(trimmed.to_string()), indent)
}

fn leading_indent(s: &str) -> usize {
    s.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_operator() {
        let token = Token::find("hello $$.name").unwrap();
        assert_eq!(Operator::Relative, token.operator);
        assert_eq!(vec!["name".to_string()], token.path);
        assert_eq!(None, token.select);
        assert_eq!(None, token.expansion);
    }

    #[test]
    fn longest_operator_wins() {
        let token = Token::find("@@!a.b.c").unwrap();
        assert_eq!(Operator::IncludeChomp, token.operator);
        assert_eq!(vec!["a", "b", "c"], token.path);
    }

    #[test]
    fn include_without_chomp() {
        let token = Token::find("@@a.b.c").unwrap();
        assert_eq!(Operator::Include, token.operator);
    }

    #[test]
    fn include_and_function_paths_need_no_leading_dot() {
        // Every worked example in the spec writes these two operators'
        // first path segment directly against the operator, unlike
        // `$$`/`!!`/`^^` which always enter a path through a literal `.`.
        assert_eq!(vec!["a", "b", "c"], Token::find("@@a.b.c").unwrap().path);
        assert_eq!(vec!["git", "name"], Token::find("%%git.name").unwrap().path);
    }

    #[test]
    fn bare_relative_operator_does_not_swallow_trailing_text() {
        let token = Token::find("$$after").unwrap();
        assert_eq!(Operator::Relative, token.operator);
        assert!(token.path.is_empty());
        assert_eq!("$$", &"$$after"[token.start..token.end]);
    }

    #[test]
    fn select_slice() {
        let token = Token::find("$$.xs [[1:3]]{{$$,}}").unwrap();
        assert_eq!(Some("1:3".to_string()), token.select);
        assert_eq!(Some("$$,".to_string()), token.expansion);
    }

    #[test]
    fn inline_expansion_preserves_trailing_space_and_newline() {
        let text = "$$.a {{ x }}\nmore";
        let token = Token::find(text).unwrap();
        assert_eq!(Some(" x ".to_string()), token.expansion);
        // The trailing newline after `}}` is not part of the match.
        assert_eq!("\nmore", &text[token.end..]);
    }

    #[test]
    fn whole_line_expansion_strips_and_absorbs() {
        let text = "$$.xs {{\n            - $$\n        }}\nafter";
        let token = Token::find(text).unwrap();
        assert_eq!(Some("- $$".to_string()), token.expansion);
        assert_eq!(12, token.indent);
        assert_eq!("after", &text[token.end..]);
    }

    #[test]
    fn function_call() {
        let token = Token::find("%%git.name").unwrap();
        assert_eq!(Operator::Function, token.operator);
        assert_eq!(vec!["git", "name"], token.path);
    }

    #[test]
    fn caret_literal_segment_in_path() {
        let token = Token::find("$$.^^.sibling").unwrap();
        assert_eq!(vec!["^^", "sibling"], token.path);
    }

    #[test]
    fn no_match_in_plain_text() {
        assert!(Token::find("no directives here").is_none());
    }
}
