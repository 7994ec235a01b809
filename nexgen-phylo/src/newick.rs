//! Low-level [Newick](https://en.wikipedia.org/wiki/Newick_format) text helpers.

use itertools::Itertools;

/// Characters that end a Newick node token.
const DELIMITERS: [char; 4] = ['(', ')', ',', ';'];

/// Characters that force a label to be quoted on output.
const RESERVED: [char; 9] = ['(', ')', ',', ':', ';', '[', ']', '\'', ' '];

/// Remove bracketed comments (ex. `[&U]`, `[&R]`) from a Newick or NEXUS string.
///
/// Brackets inside single-quoted labels are kept.
///
/// ```rust
/// use nexgen_phylo::newick::strip_comments;
/// assert_eq!(strip_comments("[&R] (A,B[90]);"), " (A,B);");
/// assert_eq!(strip_comments("('x[1]',B);"), "('x[1]',B);");
/// ```
pub fn strip_comments(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut depth = 0_usize;
    let mut quoted = false;

    for c in text.chars() {
        match c {
            '\'' if depth == 0 => {
                quoted = !quoted;
                output.push(c);
            }
            '[' if !quoted => depth += 1,
            ']' if !quoted && depth > 0 => depth -= 1,
            _ if depth > 0 => (),
            _ => output.push(c),
        }
    }
    output
}

/// Split text into `;`-terminated statements, ignoring `;` inside quoted labels.
///
/// Empty statements are skipped and the terminating `;` is not kept.
///
/// ```rust
/// use nexgen_phylo::newick::split_statements;
/// let observed = split_statements("(A,B);\n(A,'C;D');\n\n");
/// assert_eq!(observed, vec!["(A,B)", "(A,'C;D')"]);
/// ```
pub fn split_statements(text: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in text.chars() {
        match c {
            '\'' => {
                quoted = !quoted;
                current.push(c);
            }
            ';' if !quoted => statements.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    statements.push(current);

    statements.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect_vec()
}

/// Read one node token (label and branch attributes) starting at `pos`.
///
/// Advances `pos` to the first delimiter after the token.
pub fn read_token(chars: &[char], pos: &mut usize) -> String {
    let mut token = String::new();
    let mut quoted = false;

    while let Some(&c) = chars.get(*pos) {
        if c == '\'' {
            quoted = !quoted;
        } else if !quoted && DELIMITERS.contains(&c) {
            break;
        }
        token.push(c);
        *pos += 1;
    }
    token.trim().to_string()
}

/// Quote a label for output if it contains reserved Newick characters.
///
/// ```rust
/// use nexgen_phylo::newick::quote_label;
/// assert_eq!(quote_label("A"), "A");
/// assert_eq!(quote_label("Homo sapiens"), "'Homo sapiens'");
/// ```
pub fn quote_label(label: &str) -> String {
    match label.chars().any(|c| RESERVED.contains(&c)) {
        true => format!("'{}'", label.replace('\'', "''")),
        false => label.to_string(),
    }
}
