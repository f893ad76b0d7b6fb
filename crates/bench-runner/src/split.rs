//! Statement splitting.

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scan {
    Code,
    SingleQuote,
    DoubleQuote,
    LineComment,
    BlockComment,
}

/// Split workload text into statements on `;`.
///
/// Semicolons inside string literals, quoted identifiers and comments do not
/// terminate a statement. Fragments holding only whitespace and comments are
/// dropped. Returned statements are trimmed and carry no terminator.
pub fn split_statements(text: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut has_code = false;
    let mut scan = Scan::Code;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match scan {
            Scan::Code => match c {
                ';' => {
                    if has_code {
                        statements.push(current.trim().to_string());
                    }
                    current.clear();
                    has_code = false;
                    continue;
                }
                '-' if chars.peek() == Some(&'-') => scan = Scan::LineComment,
                '/' if chars.peek() == Some(&'*') => {
                    current.push(c);
                    if let Some(star) = chars.next() {
                        current.push(star);
                    }
                    scan = Scan::BlockComment;
                    continue;
                }
                '\'' => {
                    scan = Scan::SingleQuote;
                    has_code = true;
                }
                '"' => {
                    scan = Scan::DoubleQuote;
                    has_code = true;
                }
                c if !c.is_whitespace() => has_code = true,
                _ => {}
            },
            Scan::SingleQuote if c == '\'' => scan = Scan::Code,
            Scan::DoubleQuote if c == '"' => scan = Scan::Code,
            Scan::LineComment if c == '\n' => scan = Scan::Code,
            Scan::BlockComment if c == '*' && chars.peek() == Some(&'/') => {
                current.push(c);
                if let Some(slash) = chars.next() {
                    current.push(slash);
                }
                scan = Scan::Code;
                continue;
            }
            _ => {}
        }
        current.push(c);
    }

    if has_code {
        statements.push(current.trim().to_string());
    }
    statements
}
