//! Parsing of the `[PROMPT]...[/PROMPT]` marker the assistant uses to hand
//! over a finalized edit instruction.

const OPEN: &str = "[PROMPT]";
const CLOSE: &str = "[/PROMPT]";

/// Extracts the finalized instruction from an assistant reply, if present.
///
/// Only the first marker pair counts; the enclosed text is trimmed.
pub fn extract_final_prompt(content: &str) -> Option<String> {
    let start = content.find(OPEN)? + OPEN.len();
    let end = start + content[start..].find(CLOSE)?;
    let prompt = content[start..end].trim();
    if prompt.is_empty() {
        None
    } else {
        Some(prompt.to_string())
    }
}

/// Strips every marker span from a reply so the transcript shown to the user
/// never contains the raw delimiters.
pub fn strip_prompt_markers(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    loop {
        match rest.find(OPEN) {
            Some(open_at) => {
                out.push_str(&rest[..open_at]);
                let after_open = &rest[open_at + OPEN.len()..];
                match after_open.find(CLOSE) {
                    Some(close_at) => {
                        rest = &after_open[close_at + CLOSE.len()..];
                    }
                    None => {
                        // Unterminated marker; keep the text as-is.
                        out.push_str(&rest[open_at..]);
                        break;
                    }
                }
            }
            None => {
                out.push_str(rest);
                break;
            }
        }
    }
    out.trim().to_string()
}
