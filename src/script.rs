//! Script splitting

/// Split a script into the statements to run, in source order.
///
/// The text is cut on every `;`. Whatever follows the last `;` is dropped,
/// so a script must end with `;` for its final statement to run. Every `\n`
/// is removed from the remaining pieces without inserting a space, which
/// means `select\n1;` becomes `select1`. Empty pieces (from `;;`) are kept
/// and left for the database to reject.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut segments: Vec<&str> = script.split(';').collect();
    segments.pop();

    segments
        .into_iter()
        .map(|segment| segment.replace('\n', ""))
        .collect()
}

/// The text after the last `;`, if it is more than whitespace.
///
/// [`split_statements`] drops this text; callers use it to warn about it.
pub fn trailing_fragment(script: &str) -> Option<&str> {
    let tail = match script.rfind(';') {
        Some(pos) => &script[pos + 1..],
        None => script,
    };

    if tail.trim().is_empty() {
        None
    } else {
        Some(tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_every_delimiter_and_drops_last_segment() {
        assert_eq!(split_statements("a;b;c;"), vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_script_yields_nothing() {
        assert!(split_statements("").is_empty());
    }

    #[test]
    fn statement_without_delimiter_is_dropped() {
        assert!(split_statements("select 1").is_empty());
        assert_eq!(split_statements("select 1; select 2"), vec!["select 1"]);
    }

    #[test]
    fn consecutive_delimiters_yield_empty_statement() {
        assert_eq!(split_statements("a;;b;"), vec!["a", "", "b"]);
    }

    #[test]
    fn newlines_are_removed_not_replaced() {
        assert_eq!(split_statements("select\n1;"), vec!["select1"]);
        assert_eq!(
            split_statements("SELECT *\nFROM t;\nSELECT 2;\n"),
            vec!["SELECT *FROM t", "SELECT 2"]
        );
    }

    #[test]
    fn carriage_returns_are_kept() {
        assert_eq!(split_statements("a\r\nb;"), vec!["a\rb"]);
    }

    #[test]
    fn rejoined_statements_match_stripped_script() {
        let scripts = [
            "select 1;\nselect 2;\n",
            "insert into t values (1);;update t set a = 2;",
            "\n\n;",
            "create table x (\n  id int\n);",
        ];

        for script in scripts {
            let statements = split_statements(script);
            let end = script.rfind(';').map(|p| p + 1).unwrap_or(0);
            let expected = script[..end].replace('\n', "");

            let mut rejoined = statements.join(";");
            if !statements.is_empty() {
                rejoined.push(';');
            }
            assert_eq!(rejoined, expected, "script: {:?}", script);
        }
    }

    #[test]
    fn trailing_fragment_reports_dropped_text() {
        assert_eq!(trailing_fragment("a;b"), Some("b"));
        assert_eq!(trailing_fragment("select 1"), Some("select 1"));
        assert_eq!(trailing_fragment("a;\n  \n"), None);
        assert_eq!(trailing_fragment(""), None);
    }
}
