//! Cleanup of JSON emitted by chat models.

/// Repair the usual defects in model-written JSON.
///
/// Doubled braces (left over from prompt templating) are collapsed and `\/`
/// is unescaped. If the text still does not parse, trailing commas before a
/// closing bracket or brace are removed.
pub fn clean_json_output(raw: &str) -> String {
    let text = raw
        .replace("{{", "{")
        .replace("}}", "}")
        .replace("\\/", "/");

    if serde_json::from_str::<serde_json::Value>(&text).is_ok() {
        return text;
    }

    if let Ok(re) = regex_lite::Regex::new(r",\s*([\]}])") {
        return re.replace_all(&text, "$1").into_owned();
    }
    text
}
