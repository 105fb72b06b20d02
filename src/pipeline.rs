//! Pipeline decomposition and per-stage argument parsing.
//!
//! The splitter cuts an expanded input line into stage command-strings at
//! `|` boundaries; the stage parser then extracts an optional `>` redirection
//! target and tokenizes the remainder into an argument vector. Whitespace
//! trimming is the stage parser's job, not the splitter's.

use std::fmt;

/// Split an expanded line into stage command-strings, in execution order.
///
/// The split is strict: there is no quote awareness, and consecutive or
/// trailing `|` delimiters yield empty stage strings that [`parse_stage`]
/// rejects.
pub fn split_pipeline(input: &str) -> Vec<&str> {
    input.split('|').collect()
}

/// One parsed pipeline stage: the command's argument vector and, when a `>`
/// clause was present, the path its standard output is redirected to.
///
/// The redirection always truncates; there is no append mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDescriptor {
    pub argv: Vec<String>,
    pub redirect: Option<String>,
}

/// Errors detected while parsing a single pipeline stage.
///
/// Any of these fails the whole pipeline before a single process is
/// spawned, so a malformed stage can never leave siblings running without
/// a terminating partner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageParseError {
    /// The stage contains no tokens at all (`""`, `"   "`, or the segments
    /// produced by `a | | b`).
    EmptyStage,
    /// A `>` with no target word after it.
    MissingRedirectTarget,
}

impl fmt::Display for StageParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageParseError::EmptyStage => write!(f, "empty command in pipeline"),
            StageParseError::MissingRedirectTarget => write!(f, "redirect without a target file"),
        }
    }
}

impl std::error::Error for StageParseError {}

/// Parse one stage command-string into a [`StageDescriptor`].
///
/// The first `>` in the text starts the redirection clause: the next
/// whitespace-delimited word is the target path and anything after that
/// word is discarded. The text before the `>` is tokenized on whitespace
/// into the argument vector, which must not be empty.
pub fn parse_stage(text: &str) -> Result<StageDescriptor, StageParseError> {
    let (command, redirect) = match text.find('>') {
        Some(pos) => {
            let target = text[pos + 1..]
                .split_whitespace()
                .next()
                .ok_or(StageParseError::MissingRedirectTarget)?;
            (&text[..pos], Some(target.to_string()))
        }
        None => (text, None),
    };

    let argv: Vec<String> = command.split_whitespace().map(str::to_string).collect();
    if argv.is_empty() {
        return Err(StageParseError::EmptyStage);
    }

    Ok(StageDescriptor { argv, redirect })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(descriptor: &StageDescriptor) -> Vec<&str> {
        descriptor.argv.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_split_preserves_stage_order_and_whitespace() {
        assert_eq!(split_pipeline("a | b | c"), vec!["a ", " b ", " c"]);
    }

    #[test]
    fn test_split_keeps_empty_segments() {
        assert_eq!(split_pipeline("a||b"), vec!["a", "", "b"]);
        assert_eq!(split_pipeline("a|"), vec!["a", ""]);
        assert_eq!(split_pipeline(""), vec![""]);
    }

    #[test]
    fn test_parse_plain_command() {
        let stage = parse_stage("  echo  hello   world ").unwrap();
        assert_eq!(argv(&stage), vec!["echo", "hello", "world"]);
        assert_eq!(stage.redirect, None);
    }

    #[test]
    fn test_parse_redirect_target() {
        let stage = parse_stage("echo hi > out.txt").unwrap();
        assert_eq!(argv(&stage), vec!["echo", "hi"]);
        assert_eq!(stage.redirect, Some("out.txt".to_string()));
    }

    #[test]
    fn test_redirect_takes_first_word_only() {
        let stage = parse_stage("echo hi >out.txt trailing junk").unwrap();
        assert_eq!(argv(&stage), vec!["echo", "hi"]);
        assert_eq!(stage.redirect, Some("out.txt".to_string()));
    }

    #[test]
    fn test_empty_stage_is_an_error() {
        assert_eq!(parse_stage(""), Err(StageParseError::EmptyStage));
        assert_eq!(parse_stage("   "), Err(StageParseError::EmptyStage));
    }

    #[test]
    fn test_redirect_with_no_command_is_an_empty_stage() {
        assert_eq!(parse_stage(" > out.txt"), Err(StageParseError::EmptyStage));
    }

    #[test]
    fn test_redirect_without_target_is_an_error() {
        assert_eq!(parse_stage("echo hi >"), Err(StageParseError::MissingRedirectTarget));
        assert_eq!(parse_stage("echo hi >   "), Err(StageParseError::MissingRedirectTarget));
    }
}
