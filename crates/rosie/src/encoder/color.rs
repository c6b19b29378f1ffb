// Terminal highlighting
// The input record is echoed with each capture wrapped in ANSI SGR escapes.
// Colors come from a color map: `type=color;attr:pkg.*=color:*=color`.
// The most specific entry wins: exact type, then `pkg.*`, then `*`.

use crate::encoder::{EncodeContext, Encoder};
use crate::rosie_vm::RosieResult;
use crate::rpl_pattern::MatchNode;
use smol_str::SmolStr;

pub const DEFAULT_COLORS: &str =
    "*=default;bold:net.*=red:net.fqdn=red;underline:num.*=underline:word.*=yellow";

const RESET: &[u8] = b"\x1b[0m";

#[derive(Debug, Clone)]
pub struct ColorMap {
    entries: Vec<(SmolStr, String)>,
}

impl Default for ColorMap {
    fn default() -> Self {
        let mut map = ColorMap {
            entries: Vec::new(),
        };
        // the built-in spec always parses
        let _ = map.merge(DEFAULT_COLORS);
        map
    }
}

fn sgr_code(word: &str) -> Option<&'static str> {
    let code = match word {
        "default" => "39",
        "black" => "30",
        "red" => "31",
        "green" => "32",
        "yellow" => "33",
        "blue" => "34",
        "magenta" => "35",
        "cyan" => "36",
        "white" => "37",
        "bold" => "1",
        "faint" => "2",
        "italic" => "3",
        "underline" => "4",
        "blink" => "5",
        "reverse" => "7",
        _ => return None,
    };
    Some(code)
}

impl ColorMap {
    /// Merge `spec` over the current entries. Entries with an unknown color word are rejected.
    pub fn merge(&mut self, spec: &str) -> Result<(), String> {
        let mut parsed = Vec::new();
        for entry in spec.split(':').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((key, value)) = entry.split_once('=') else {
                return Err(format!("color entry '{}' is not of the form type=color", entry));
            };
            let mut codes = Vec::new();
            for word in value.split(';').map(str::trim).filter(|w| !w.is_empty()) {
                match sgr_code(word) {
                    Some(code) => codes.push(code),
                    None => return Err(format!("unknown color or attribute '{}'", word)),
                }
            }
            if codes.is_empty() {
                return Err(format!("color entry '{}' names no color", entry));
            }
            parsed.push((SmolStr::new(key.trim()), codes.join(";")));
        }

        for (key, sgr) in parsed {
            match self.entries.iter_mut().find(|(k, _)| *k == key) {
                Some(existing) => existing.1 = sgr,
                None => self.entries.push((key, sgr)),
            }
        }
        Ok(())
    }

    pub fn lookup(&self, kind: &str) -> Option<&str> {
        let find = |key: &str| {
            self.entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        if let Some(sgr) = find(kind) {
            return Some(sgr);
        }
        if let Some((pkg, _)) = kind.rsplit_once('.')
            && let Some(sgr) = find(&format!("{}.*", pkg))
        {
            return Some(sgr);
        }
        find("*")
    }

    /// The map in its own `type=color:...` syntax.
    pub fn to_spec(&self) -> String {
        self.entries
            .iter()
            .map(|(key, sgr)| {
                let words: Vec<&str> = sgr.split(';').filter_map(code_word).collect();
                format!("{}={}", key, words.join(";"))
            })
            .collect::<Vec<_>>()
            .join(":")
    }
}

fn code_word(code: &str) -> Option<&'static str> {
    [
        "default", "black", "red", "green", "yellow", "blue", "magenta", "cyan", "white", "bold",
        "faint", "italic", "underline", "blink", "reverse",
    ]
    .into_iter()
    .find(|word| sgr_code(word) == Some(code))
}

pub struct ColorEncoder;

impl Encoder for ColorEncoder {
    fn encode(&self, cx: &EncodeContext) -> RosieResult<Option<Vec<u8>>> {
        let input = cx.input;
        let node = cx.node;
        let mut out = Vec::with_capacity(input.len() + 32);
        out.extend_from_slice(&input[..node.start.min(input.len())]);
        render(&mut out, node, input, cx);
        out.extend_from_slice(input.get(node.end..).unwrap_or(&[]));
        Ok(Some(out))
    }
}

fn paint(out: &mut Vec<u8>, text: &[u8], sgr: Option<&str>) {
    if text.is_empty() {
        return;
    }
    match sgr {
        Some(sgr) => {
            out.extend_from_slice(b"\x1b[");
            out.extend_from_slice(sgr.as_bytes());
            out.push(b'm');
            out.extend_from_slice(text);
            out.extend_from_slice(RESET);
        }
        None => out.extend_from_slice(text),
    }
}

// Children are painted in their own colors, the gaps between them in the parent's
fn render(out: &mut Vec<u8>, node: &MatchNode, input: &[u8], cx: &EncodeContext) {
    let sgr = cx.colors.lookup(&node.kind);
    let mut cursor = node.start;
    for sub in &node.subs {
        paint(out, input.get(cursor..sub.start).unwrap_or(&[]), sgr);
        render(out, sub, input, cx);
        cursor = sub.end;
    }
    paint(out, input.get(cursor..node.end).unwrap_or(&[]), sgr);
}
