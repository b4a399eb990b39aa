//! HTML 組み立て用の小道具

/// テキストを HTML 本文・属性値として安全にする
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// `<script>` に埋め込む JSON。`</script>` で閉じられないよう `</` を逃がす
pub fn script_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"O'Hare\" & co</b>"), "&lt;b&gt;&quot;O&#x27;Hare&quot; &amp; co&lt;/b&gt;");
    }

    #[test]
    fn test_script_json_escapes_close_tag() {
        let s = script_json(&vec!["</script><script>alert(1)</script>"]);
        assert!(!s.contains("</script>"));
    }
}
