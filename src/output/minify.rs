//! Line-oriented, idempotent Markdown minifier: drops HTML comments, blank
//! lines, and thematic breaks outside of fenced code blocks.

/// Which fence character opened the current fenced code block, if any.
#[derive(Clone, Copy, PartialEq)]
enum Fence {
    Backtick,
    Tilde,
}

fn fence_opener(line: &str) -> Option<Fence> {
    let trimmed = line.trim_start_matches(' ');
    if trimmed.starts_with("```") {
        Some(Fence::Backtick)
    } else if trimmed.starts_with("~~~") {
        Some(Fence::Tilde)
    } else {
        None
    }
}

fn fence_closes(line: &str, fence: Fence) -> bool {
    let trimmed = line.trim_start_matches(' ');
    match fence {
        Fence::Backtick => trimmed.starts_with("```"),
        Fence::Tilde => trimmed.starts_with("~~~"),
    }
}

/// Strips `<!-- ... -->` spans from `line`. A comment may have opened on a
/// previous line (`in_comment`); returns the stripped line and whether a
/// comment is still open at the end of it. An unterminated comment drops
/// everything from its start onward.
fn strip_html_comments(line: &str, mut in_comment: bool) -> (String, bool) {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    loop {
        if in_comment {
            match rest.find("-->") {
                Some(idx) => {
                    rest = &rest[idx + 3..];
                    in_comment = false;
                }
                None => return (out, true),
            }
            continue;
        }

        match rest.find("<!--") {
            Some(idx) => {
                out.push_str(&rest[..idx]);
                rest = &rest[idx + 4..];
                in_comment = true;
            }
            None => {
                out.push_str(rest);
                break;
            }
        }
    }

    (out, in_comment)
}

fn is_thematic_break(trimmed: &str) -> bool {
    trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-')
}

/// Minifies a Markdown buffer. See module docs for the per-line rules.
pub fn minify(content: &str) -> String {
    let had_trailing_newline = content.ends_with('\n');
    let mut output_lines: Vec<String> = Vec::new();
    let mut fence: Option<Fence> = None;
    let mut in_comment = false;

    for line in content.split('\n') {
        if let Some(open) = fence {
            output_lines.push(line.to_string());
            if fence_closes(line, open) {
                fence = None;
            }
            continue;
        }

        if let Some(open) = fence_opener(line) {
            fence = Some(open);
            output_lines.push(line.to_string());
            continue;
        }

        let (stripped, still_open) = strip_html_comments(line, in_comment);
        in_comment = still_open;

        let normalized = if stripped.ends_with("  ") && !stripped.ends_with("   ") {
            stripped
        } else {
            stripped.trim_end_matches([' ', '\t']).to_string()
        };

        if normalized.trim().is_empty() {
            continue;
        }
        if is_thematic_break(normalized.trim()) {
            continue;
        }

        output_lines.push(normalized);
    }

    let mut minified = output_lines.join("\n");
    if had_trailing_newline && !minified.is_empty() {
        minified.push('\n');
    }
    minified
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_blank_lines() {
        assert_eq!(minify("a\n\nb"), "a\nb");
    }

    #[test]
    fn preserves_fenced_code_verbatim() {
        let input = "```\n  spaced  \n\n---\n```\ntext";
        let result = minify(input);
        assert!(result.contains("  spaced  \n\n---"));
    }

    #[test]
    fn tilde_and_backtick_fences_dont_cross_close() {
        let input = "~~~\n```\n~~~\nafter";
        let result = minify(input);
        assert!(result.contains("```"));
    }

    #[test]
    fn strips_html_comments() {
        assert_eq!(minify("a <!-- hidden --> b"), "a  b");
    }

    #[test]
    fn strips_multiline_html_comments() {
        let input = "before <!-- start\nmiddle\nend --> after";
        assert_eq!(minify(input), "before after");
    }

    #[test]
    fn unterminated_comment_drops_rest_of_input() {
        let input = "keep\n<!-- never closes\nmore text";
        assert_eq!(minify(input), "keep");
    }

    #[test]
    fn preserves_hard_break_two_trailing_spaces() {
        let input = "line one  \nline two";
        let result = minify(input);
        assert!(result.starts_with("line one  \n"));
    }

    #[test]
    fn three_or_more_trailing_spaces_are_stripped() {
        let input = "line one   \nline two";
        let result = minify(input);
        assert!(result.starts_with("line one\n"));
    }

    #[test]
    fn discards_thematic_breaks() {
        assert_eq!(minify("a\n---\nb"), "a\nb");
        assert_eq!(minify("a\n-----\nb"), "a\nb");
    }

    #[test]
    fn preserves_lines_that_merely_start_with_hyphens() {
        assert_eq!(minify("--- note"), "--- note");
        assert_eq!(minify("----x"), "----x");
    }

    #[test]
    fn preserves_trailing_newline_when_present() {
        assert_eq!(minify("a\nb\n"), "a\nb\n");
        assert_eq!(minify("a\nb"), "a\nb");
    }

    #[test]
    fn is_idempotent() {
        let inputs = [
            "# Title\n\n\npara <!-- c -->\n---\ntrailing  \n```\ncode   \n```\n",
            "",
            "no special content here\n",
        ];
        for input in inputs {
            let once = minify(input);
            let twice = minify(&once);
            assert_eq!(once, twice);
        }
    }
}
