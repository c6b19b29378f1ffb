// Bracket expression parser
// Turns the raw text of a `[...]` token into a CharSet:
//   [:digit:]  [:^space:]  [a-z]  [abc]  [^abc]  [[:digit:][a-f]]
// Backslash escapes: \] \[ \\ \- \^ \n \r \t and \xHH

use crate::rpl_pattern::{CharClass, CharSet, SetItem};

pub fn parse_charset(text: &str) -> Result<CharSet, String> {
    let chars: Vec<char> = text.chars().collect();
    let (set, pos) = parse_set(&chars, 0)?;
    if pos != chars.len() {
        return Err(format!("unexpected text after character set: {}", text));
    }
    Ok(set)
}

/// Parse the set starting at `chars[pos] == '['`. Returns the set and the index past its `]`.
fn parse_set(chars: &[char], mut pos: usize) -> Result<(CharSet, usize), String> {
    if chars.get(pos) != Some(&'[') {
        return Err("character set must start with '['".to_string());
    }
    pos += 1;

    if chars.get(pos) == Some(&':') {
        return parse_named(chars, pos + 1);
    }

    let mut negated = false;
    if chars.get(pos) == Some(&'^') {
        negated = true;
        pos += 1;
    }

    let mut items = Vec::new();
    loop {
        let c = match chars.get(pos) {
            Some(c) => *c,
            None => return Err("malformed character set (missing ']')".to_string()),
        };
        match c {
            ']' => {
                pos += 1;
                break;
            }
            '[' => {
                let (nested, next) = parse_set(chars, pos)?;
                items.push(SetItem::Nested(nested));
                pos = next;
            }
            _ => {
                let (first, next) = parse_char(chars, pos)?;
                pos = next;
                // a '-' followed by ']' is a literal dash
                if chars.get(pos) == Some(&'-') && chars.get(pos + 1).is_some_and(|c| *c != ']') {
                    let (last, next) = parse_char(chars, pos + 1)?;
                    if last < first {
                        return Err(format!(
                            "invalid range {}-{} in character set",
                            first.escape_default(),
                            last.escape_default()
                        ));
                    }
                    items.push(SetItem::Range(first, last));
                    pos = next;
                } else {
                    items.push(SetItem::Char(first));
                }
            }
        }
    }

    if items.is_empty() {
        return Err("empty character set".to_string());
    }
    Ok((CharSet { items, negated }, pos))
}

// `[:name:]` / `[:^name:]`, with `pos` just past the opening ':'
fn parse_named(chars: &[char], mut pos: usize) -> Result<(CharSet, usize), String> {
    let mut inverted = false;
    if chars.get(pos) == Some(&'^') {
        inverted = true;
        pos += 1;
    }
    let start = pos;
    while chars.get(pos).is_some_and(|c| c.is_ascii_alphanumeric() || *c == '_') {
        pos += 1;
    }
    let name: String = chars[start..pos].iter().collect();
    if chars.get(pos) != Some(&':') || chars.get(pos + 1) != Some(&']') {
        return Err(format!("malformed named character set [:{}", name));
    }
    let class = CharClass::from_name(&name)
        .ok_or_else(|| format!("unknown named charset: {}", name))?;
    let item = if inverted {
        SetItem::InvertedClass(class)
    } else {
        SetItem::Class(class)
    };
    Ok((
        CharSet {
            items: vec![item],
            negated: false,
        },
        pos + 2,
    ))
}

fn parse_char(chars: &[char], pos: usize) -> Result<(char, usize), String> {
    let c = chars[pos];
    if c != '\\' {
        return Ok((c, pos + 1));
    }
    let escaped = match chars.get(pos + 1) {
        Some(e) => *e,
        None => return Err("character set ends with a lone backslash".to_string()),
    };
    let decoded = match escaped {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'x' => {
            let hex: String = chars.iter().skip(pos + 2).take(2).collect();
            let value = u8::from_str_radix(&hex, 16)
                .ok()
                .filter(|_| hex.len() == 2)
                .ok_or_else(|| "invalid \\x escape in character set".to_string())?;
            return Ok((value as char, pos + 4));
        }
        ']' | '[' | '\\' | '-' | '^' | ':' => escaped,
        other => return Err(format!("invalid escape '\\{}' in character set", other)),
    };
    Ok((decoded, pos + 2))
}
