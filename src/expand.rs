//! `$NAME` variable expansion, applied to a raw input line before it is
//! split into pipeline stages.

use crate::env::Environment;

/// Substitute every `$NAME` reference in `input` with its value from the
/// variable store.
///
/// The scan runs left to right: literal text is copied verbatim, and each
/// `$` consumes the maximal run of ASCII alphanumerics and underscores that
/// follows it as the variable name. A defined name is replaced by its value;
/// an undefined name expands to nothing and the whole `$NAME` token
/// vanishes. There is no escaping: a `$` followed by no name characters is
/// itself consumed as an empty reference.
pub fn expand(input: &str, env: &Environment) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(dollar) = rest.find('$') {
        out.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];
        let name_end = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if let Some(value) = env.lookup(&after[..name_end]) {
            out.push_str(value);
        }
        rest = &after[name_end..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::expand;
    use crate::env::Environment;

    fn env_with(bindings: &[(&str, &str)]) -> Environment {
        let mut env = Environment::new();
        for (name, value) in bindings {
            env.set(*name, *value).unwrap();
        }
        env
    }

    #[test]
    fn test_no_dollar_is_identity() {
        let env = Environment::new();
        assert_eq!(expand("echo hello | tr a-z A-Z", &env), "echo hello | tr a-z A-Z");
        assert_eq!(expand("", &env), "");
    }

    #[test]
    fn test_defined_variable_is_substituted() {
        let env = env_with(&[("NAME", "VALUE")]);
        assert_eq!(expand("pre$NAME post", &env), "preVALUE post");
    }

    #[test]
    fn test_name_ends_at_first_non_identifier_char() {
        let env = env_with(&[("NAME", "VALUE")]);
        assert_eq!(expand("pre$NAME-post", &env), "preVALUE-post");
        assert_eq!(expand("$NAME/$NAME", &env), "VALUE/VALUE");
    }

    #[test]
    fn test_undefined_variable_vanishes() {
        let env = Environment::new();
        assert_eq!(expand("echo $MISSING!", &env), "echo !");
    }

    #[test]
    fn test_bare_dollar_is_consumed() {
        let env = Environment::new();
        assert_eq!(expand("a$ b", &env), "a b");
        assert_eq!(expand("trailing$", &env), "trailing");
    }

    #[test]
    fn test_digits_and_underscore_belong_to_the_name() {
        let env = env_with(&[("VAR_2", "ok")]);
        assert_eq!(expand("$VAR_2", &env), "ok");
        // VAR_2X is a different (unset) name, not VAR_2 followed by X
        assert_eq!(expand("$VAR_2X", &env), "");
    }

    #[test]
    fn test_adjacent_references() {
        let env = env_with(&[("A", "1"), ("B", "2")]);
        assert_eq!(expand("$A$B", &env), "12");
    }
}
