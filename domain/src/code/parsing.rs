//! Extract file changes from fenced code blocks.
//!
//! Recognized path markers, checked in this order:
//!
//! - fence info: ` ```rust src/lib.rs ` or ` ```rust:src/lib.rs `
//! - the line just before the fence: `### src/lib.rs`, `File: src/lib.rs`,
//!   `` `src/lib.rs` ``
//! - a first-line comment inside the block: `// src/lib.rs`, `# path: app.py`
//!
//! Blocks without any path get `snippet_N.<ext>`.

use super::change::CodeChange;

pub fn parse_code_blocks(response: &str) -> Vec<CodeChange> {
    let mut changes = Vec::new();
    let mut previous_line = "";
    let mut current: Option<(Option<String>, &str, Vec<&str>)> = None;

    for line in response.lines() {
        let trimmed = line.trim_start();
        match current.take() {
            None => {
                if let Some(info) = trimmed.strip_prefix("```") {
                    let (lang, path) = split_fence_info(info.trim());
                    let path = path.or_else(|| path_from_heading(previous_line));
                    current = Some((path, lang, Vec::new()));
                } else if !trimmed.is_empty() {
                    previous_line = trimmed;
                }
            }
            Some((path, lang, mut body)) => {
                if trimmed.starts_with("```") {
                    changes.push(finish_block(path, lang, body, changes.len() + 1));
                    previous_line = "";
                } else {
                    body.push(line);
                    current = Some((path, lang, body));
                }
            }
        }
    }

    // Unterminated final block
    if let Some((path, lang, body)) = current {
        changes.push(finish_block(path, lang, body, changes.len() + 1));
    }

    changes
}

fn finish_block(path: Option<String>, lang: &str, mut body: Vec<&str>, index: usize) -> CodeChange {
    let path = match path {
        Some(p) => p,
        None => match body.first().and_then(|l| path_from_comment(l)) {
            Some(p) => {
                body.remove(0);
                p
            }
            None => format!("snippet_{}.{}", index, extension_for(lang)),
        },
    };
    CodeChange::new(path, body.join("\n"))
}

fn split_fence_info(info: &str) -> (&str, Option<String>) {
    if let Some((lang, path)) = info.split_once(':')
        && looks_like_path(path)
    {
        return (lang.trim(), Some(path.trim().to_string()));
    }
    let mut parts = info.split_whitespace();
    let lang = parts.next().unwrap_or("");
    if looks_like_path(lang) && lang.contains('/') {
        return ("", Some(lang.to_string()));
    }
    let path = parts.find(|p| looks_like_path(p)).map(str::to_string);
    (lang, path)
}

fn path_from_heading(line: &str) -> Option<String> {
    let line = line.trim_start_matches('#').trim();
    let line = line
        .strip_prefix("File:")
        .or_else(|| line.strip_prefix("file:"))
        .or_else(|| line.strip_prefix("Path:"))
        .unwrap_or(line)
        .trim()
        .trim_matches(|c| c == '`' || c == '*' || c == ':');
    looks_like_path(line).then(|| line.to_string())
}

fn path_from_comment(line: &str) -> Option<String> {
    let rest = line
        .trim()
        .strip_prefix("//")
        .or_else(|| line.trim().strip_prefix('#'))?
        .trim();
    let rest = rest
        .strip_prefix("path:")
        .or_else(|| rest.strip_prefix("file:"))
        .unwrap_or(rest)
        .trim();
    looks_like_path(rest).then(|| rest.to_string())
}

fn looks_like_path(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty()
        && !s.contains(char::is_whitespace)
        && s.rsplit_once('.')
            .is_some_and(|(stem, ext)| !stem.is_empty() && !ext.is_empty() && ext.len() <= 5)
}

fn extension_for(lang: &str) -> &'static str {
    match lang.to_lowercase().as_str() {
        "rust" | "rs" => "rs",
        "python" | "py" => "py",
        "typescript" | "ts" => "ts",
        "javascript" | "js" => "js",
        "go" => "go",
        "java" => "java",
        "bash" | "sh" | "shell" => "sh",
        "toml" => "toml",
        "json" => "json",
        _ => "txt",
    }
}
