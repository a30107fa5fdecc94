//! MOTD flattening and terminal rendering.
//!
//! A description is a bare string, a chat component object (`text`, `extra`,
//! colour and style flags) or an array of components. Both forms may embed
//! legacy `§` formatting codes.

use serde_json::Value;

const SECTION: char = '§';
const ANSI_RESET: &str = "\x1b[0m";

/// Legacy colour code, component colour name, ANSI SGR sequence.
const COLORS: [(char, &str, &str); 16] = [
    ('0', "black", "\x1b[30m"),
    ('1', "dark_blue", "\x1b[34m"),
    ('2', "dark_green", "\x1b[32m"),
    ('3', "dark_aqua", "\x1b[36m"),
    ('4', "dark_red", "\x1b[31m"),
    ('5', "dark_purple", "\x1b[35m"),
    ('6', "gold", "\x1b[33m"),
    ('7', "gray", "\x1b[37m"),
    ('8', "dark_gray", "\x1b[90m"),
    ('9', "blue", "\x1b[94m"),
    ('a', "green", "\x1b[92m"),
    ('b', "aqua", "\x1b[96m"),
    ('c', "red", "\x1b[91m"),
    ('d', "light_purple", "\x1b[95m"),
    ('e', "yellow", "\x1b[93m"),
    ('f', "white", "\x1b[97m"),
];

const STYLES: [(char, &str, &str); 4] = [
    ('l', "bold", "\x1b[1m"),
    ('o', "italic", "\x1b[3m"),
    ('n', "underlined", "\x1b[4m"),
    ('m', "strikethrough", "\x1b[9m"),
];

/// The MOTD as plain text, without any formatting codes.
pub fn plain_text(motd: &Value) -> String {
    strip_codes(&to_legacy(motd))
}

/// The MOTD with formatting turned into ANSI escapes, reset at the end.
pub fn to_ansi(motd: &Value) -> String {
    let legacy = to_legacy(motd);
    let mut out = String::with_capacity(legacy.len() + 16);
    let mut chars = legacy.chars();
    while let Some(c) = chars.next() {
        if c != SECTION {
            out.push(c);
            continue;
        }
        let Some(code) = chars.next().map(|c| c.to_ascii_lowercase()) else {
            break;
        };
        if let Some((_, _, sgr)) = COLORS.iter().find(|(k, _, _)| *k == code) {
            // A colour code also clears earlier styles.
            out.push_str(ANSI_RESET);
            out.push_str(sgr);
        } else if let Some((_, _, sgr)) = STYLES.iter().find(|(k, _, _)| *k == code) {
            out.push_str(sgr);
        } else if code == 'r' {
            out.push_str(ANSI_RESET);
        }
    }
    out.push_str(ANSI_RESET);
    out
}

/// Flatten a description into one string using `§` codes for component styles.
fn to_legacy(motd: &Value) -> String {
    let mut out = String::new();
    flatten(motd, &mut out);
    out
}

fn flatten(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => out.push_str(s),
        Value::Array(parts) => parts.iter().for_each(|p| flatten(p, out)),
        Value::Object(obj) => {
            if let Some(code) = obj
                .get("color")
                .and_then(Value::as_str)
                .and_then(|name| COLORS.iter().find(|(_, n, _)| *n == name))
                .map(|(k, _, _)| *k)
            {
                out.push(SECTION);
                out.push(code);
            }
            for (code, name, _) in STYLES {
                if obj.get(name).and_then(Value::as_bool) == Some(true) {
                    out.push(SECTION);
                    out.push(code);
                }
            }
            if let Some(text) = obj.get("text").and_then(Value::as_str) {
                out.push_str(text);
            }
            if let Some(extra) = obj.get("extra") {
                flatten(extra, out);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn strip_codes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == SECTION {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_string_with_codes() {
        let motd = json!("§aWelcome §lto §rthe server");
        assert_eq!(plain_text(&motd), "Welcome to the server");
    }

    #[test]
    fn component_tree() {
        let motd = json!({
            "text": "Hello",
            "extra": [
                {"text": ", ", "color": "gray"},
                {"text": "world", "bold": true, "extra": [{"text": "!"}]}
            ]
        });
        assert_eq!(plain_text(&motd), "Hello, world!");
    }

    #[test]
    fn top_level_array() {
        let motd = json!(["a", {"text": "b"}, ["c"]]);
        assert_eq!(plain_text(&motd), "abc");
    }

    #[test]
    fn ansi_from_legacy_codes() {
        let motd = json!("§cRed§r plain");
        assert_eq!(to_ansi(&motd), "\x1b[0m\x1b[91mRed\x1b[0m plain\x1b[0m");
    }

    #[test]
    fn ansi_from_component_color_and_style() {
        let motd = json!({"text": "Gold", "color": "gold", "bold": true});
        assert_eq!(to_ansi(&motd), "\x1b[0m\x1b[33m\x1b[1mGold\x1b[0m");
    }

    #[test]
    fn unknown_codes_and_dangling_section_are_dropped() {
        assert_eq!(to_ansi(&json!("x§zy§")), "xy\x1b[0m");
        assert_eq!(plain_text(&json!("x§zy§")), "xy");
    }

    #[test]
    fn null_description_is_empty() {
        assert_eq!(plain_text(&Value::Null), "");
    }
}
