//! Comment stripping for hand-edited JSON configuration.
//!
//! Removes `//` line comments and `/* */` block comments that appear outside
//! string literals. Each comment character is replaced with as many spaces as
//! it takes bytes (newlines are kept), so the output has the same byte length
//! as the input and the line and column numbers reported by the JSON parser
//! still point at the right place in the original text.

/// Returns `input` with all comments blanked out.
///
/// An unterminated block comment blanks the rest of the input.
pub fn strip_json_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                chars.next();
                out.push_str("  ");
                while let Some(&next) = chars.peek() {
                    if next == '\n' || next == '\r' {
                        break;
                    }
                    chars.next();
                    push_blank(&mut out, next);
                }
            }
            ('/', Some('*')) => {
                chars.next();
                out.push_str("  ");
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        out.push(' ');
                        break;
                    }
                    push_blank(&mut out, next);
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

fn push_blank(out: &mut String, c: char) {
    if c == '\n' || c == '\r' {
        out.push(c);
    } else {
        for _ in 0..c.len_utf8() {
            out.push(' ');
        }
    }
}
