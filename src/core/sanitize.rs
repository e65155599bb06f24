// ─── Name Sanitizer ───
// Turns manifest-supplied names into path components that are safe on
// every platform the updater runs on.

/// Used when both the input and the caller's fallback sanitize to nothing.
const LAST_RESORT: &str = "_";

fn is_forbidden(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
}

fn replace_forbidden(input: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if is_forbidden(c) {
            out.push_str(replacement);
        } else {
            out.push(c);
        }
    }
    out
}

fn trim_trailing(input: &str) -> &str {
    input.trim_end_matches(|c: char| c == '.' || c.is_whitespace())
}

/// The fallback itself must be usable as a component, otherwise the
/// result could reintroduce a forbidden character.
fn clean_fallback(fallback: &str) -> String {
    let cleaned = replace_forbidden(fallback, "");
    trim_trailing(&cleaned).to_string()
}

/// Sanitize a single path component.
///
/// Every forbidden character (`\ / : * ? " < > |` and control characters)
/// is replaced with `fallback`, trailing dots and whitespace are stripped,
/// and an empty result is replaced by `fallback` (or `_` when the fallback
/// is empty too). Never returns an empty string.
pub fn sanitize_component(name: &str, fallback: &str) -> String {
    let fallback = clean_fallback(fallback);
    let replaced = replace_forbidden(name, &fallback);
    let trimmed = trim_trailing(&replaced);

    if !trimmed.is_empty() {
        trimmed.to_string()
    } else if !fallback.is_empty() {
        fallback
    } else {
        LAST_RESORT.to_string()
    }
}

/// Like [`sanitize_component`] but leaves a trailing extension intact.
///
/// The extension is whatever follows the last dot, provided that dot is
/// neither the first nor the last character.
pub fn sanitize_file_name_with_extension(name: &str, fallback: &str) -> String {
    match name.rfind('.') {
        Some(dot) if dot > 0 && dot < name.len() - 1 => {
            let stem = sanitize_component(&name[..dot], fallback);
            let extension = replace_forbidden(&name[dot + 1..], &clean_fallback(fallback));
            let extension = trim_trailing(&extension);
            if extension.is_empty() {
                stem
            } else {
                format!("{stem}.{extension}")
            }
        }
        _ => sanitize_component(name, fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_safe(result: &str) {
        assert!(!result.is_empty());
        assert!(!result.chars().any(is_forbidden), "unsafe: {result:?}");
    }

    #[test]
    fn replaces_reserved_characters() {
        assert_eq!(sanitize_component("Foo/Bar:Baz", "_"), "Foo_Bar_Baz");
        assert_eq!(sanitize_component("a<b>c|d", ""), "abcd");
    }

    #[test]
    fn strips_trailing_dots_and_spaces() {
        assert_eq!(sanitize_component("Mod Name. . ", "_"), "Mod Name");
    }

    #[test]
    fn degenerate_inputs_are_never_empty() {
        for input in ["", "...", "   ", "\\/:*?\"<>|", "\u{0}\u{7f}", ". ."] {
            assert_safe(&sanitize_component(input, ""));
            assert_safe(&sanitize_component(input, "_"));
            assert_safe(&sanitize_component(input, "/"));
        }
        assert_eq!(sanitize_component("", "fallback"), "fallback");
    }

    #[test]
    fn fallback_with_forbidden_characters_is_cleaned() {
        assert_eq!(sanitize_component("a/b", "x:y"), "axyb");
    }

    #[test]
    fn keeps_extension() {
        assert_eq!(
            sanitize_file_name_with_extension("Foo:Bar-1.0.jar", "_"),
            "Foo_Bar-1.0.jar"
        );
        assert_eq!(sanitize_file_name_with_extension("Foo. .jar", ""), "Foo.jar");
    }

    #[test]
    fn leading_or_trailing_dot_is_not_an_extension() {
        assert_eq!(sanitize_file_name_with_extension(".hidden", "_"), ".hidden");
        assert_eq!(sanitize_file_name_with_extension("name.", "_"), "name");
    }

    #[test]
    fn extension_never_smuggles_separators() {
        let result = sanitize_file_name_with_extension("a.b/../c", "");
        assert_safe(&result);
    }
}
