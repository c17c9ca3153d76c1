//! Diff rendering for golden comparison.

/// Render a line diff between the golden file and the tool output.
///
/// Non-UTF-8 bytes are shown lossily; the comparison itself is byte-exact
/// and happens elsewhere.
#[must_use]
pub fn render_diff(golden: &[u8], actual: &[u8]) -> String {
    if golden == actual {
        return String::from("[identical]");
    }

    let golden = String::from_utf8_lossy(golden);
    let actual = String::from_utf8_lossy(actual);
    let expected_lines: Vec<&str> = golden.lines().collect();
    let actual_lines: Vec<&str> = actual.lines().collect();

    let mut out = String::new();
    out.push_str("--- golden\n");
    out.push_str("+++ actual\n");
    let longest = expected_lines.len().max(actual_lines.len());
    for i in 0..longest {
        let e = expected_lines.get(i);
        let a = actual_lines.get(i);
        if e == a {
            continue;
        }
        out.push_str(&format!("@@ line {} @@\n", i + 1));
        if let Some(e) = e {
            out.push_str(&format!("-{e}\n"));
        }
        if let Some(a) = a {
            out.push_str(&format!("+{a}\n"));
        }
    }
    if expected_lines == actual_lines {
        // Only line endings or a trailing newline differ.
        out.push_str("@@ whitespace @@\n");
        out.push_str(&format!("-{golden:?}\n"));
        out.push_str(&format!("+{actual:?}\n"));
    }
    out
}
