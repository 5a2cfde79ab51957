//! Best-effort formatting of generated documents.

use crate::binding::parse_program;
use crate::error::FormatError;
use crate::plugins::Formatter;
use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_span::SourceType;

const FENCE: &str = "---";

/// Re-prints the frontmatter through `oxc_codegen` and tidies blank lines
/// across the whole document. Markup is left as written.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

impl Formatter for DefaultFormatter {
    fn format(&self, code: &str) -> Result<String, FormatError> {
        let mut out = String::with_capacity(code.len());
        let rest = match split_frontmatter(code)? {
            Some((frontmatter, rest)) => {
                let script = format_script(frontmatter)?;
                out.push_str(FENCE);
                out.push('\n');
                out.push_str(script.trim_end());
                out.push('\n');
                out.push_str(FENCE);
                out.push('\n');
                rest
            }
            None => code,
        };
        out.push_str(rest);
        Ok(tidy_blank_lines(&out))
    }
}

/// `Some((frontmatter, remainder))` when the document opens with a fence.
fn split_frontmatter(code: &str) -> Result<Option<(&str, &str)>, FormatError> {
    let Some(body) = code.strip_prefix("---\n") else {
        return Ok(None);
    };
    let end = body.find("\n---").ok_or(FormatError::UnclosedFence)?;
    let rest = &body[end + 4..];
    Ok(Some((&body[..end], rest.strip_prefix('\n').unwrap_or(rest))))
}

fn format_script(source: &str) -> Result<String, FormatError> {
    let allocator = Allocator::default();
    let source_type = SourceType::default()
        .with_typescript(true)
        .with_module(true);
    let program = parse_program(&allocator, source, source_type).map_err(FormatError::Parse)?;
    Ok(Codegen::new().build(&program).code)
}

fn tidy_blank_lines(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut blank_run = 0;
    for line in code.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    let trimmed = out.trim_end();
    format!("{}\n", trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontmatter_is_reprinted() {
        let code = "---\nlet   count=0\n---\n\n\n\n<div>{count}</div>   \n";
        let formatted = DefaultFormatter.format(code).unwrap();
        assert!(formatted.starts_with("---\nlet count = 0;\n---\n"));
        assert!(formatted.ends_with("\n<div>{count}</div>\n"));
        assert!(!formatted.contains("\n\n\n"));
    }

    #[test]
    fn test_invalid_frontmatter_is_an_error() {
        let code = "---\nlet = ;\n---\n<div />";
        assert!(matches!(
            DefaultFormatter.format(code),
            Err(FormatError::Parse(_))
        ));
        assert_eq!(
            DefaultFormatter.format("---\nlet a = 1;\n<div />"),
            Err(FormatError::UnclosedFence)
        );
    }

    #[test]
    fn test_markup_only_document() {
        assert_eq!(
            DefaultFormatter.format("<p>hi</p>\n\n\n<style>\n</style>").unwrap(),
            "<p>hi</p>\n\n<style>\n</style>\n"
        );
    }
}
