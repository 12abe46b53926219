//! Parser for validator spec strings
//!
//! The derive macro carries validators as strings like
//! `oneof(all(minlength(8),regex([A-Z].*)),isoneof(a,b))`. Parentheses are
//! required for every validator; the older `name:arg` form is rejected with
//! a dedicated error. `\,` escapes a comma that would otherwise split
//! siblings (regex quantifiers like `{2,4}` are also protected by brace
//! tracking).

use super::{
    all, alphanumeric, any, boolean, email, file_ext, float, hostname, identifier, integer, ip,
    is_not_one_of, is_one_of, length, max, max_length, min, min_length, no_whitespace, not, port,
    range, regex_with_description, url, Validator,
};
use crate::error::{ParseError, Result};

const MAX_NESTING: usize = 16;

/// Parse a comma-separated validator spec into validator values.
pub fn parse_validators(spec: &str) -> Result<Vec<Validator>> {
    parse_list(spec, 0)
}

fn parse_list(input: &str, depth: usize) -> Result<Vec<Validator>> {
    if depth > MAX_NESTING {
        return Err(ParseError::RecursionDepthExceeded { context: input.to_string() });
    }
    let mut out = Vec::new();
    for item in split_siblings(input) {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        out.push(parse_item(item, depth)?);
    }
    Ok(out)
}

fn parse_item(item: &str, depth: usize) -> Result<Validator> {
    let Some(open) = item.find('(') else {
        // `minlength:5` and bare `email` are both the old colon style
        let name = item.split(':').next().unwrap_or(item).trim().to_string();
        return Err(ParseError::ValidatorMustUseParentheses { name });
    };
    if !item.ends_with(')') {
        return Err(ParseError::ValidatorMustUseParentheses {
            name: item[..open].trim().to_string(),
        });
    }
    let name = item[..open].trim().to_lowercase();
    let args = &item[open + 1..item.len() - 1];

    let validator = match name.as_str() {
        "email" | "mail" => email(),
        "url" => url(),
        "integer" | "int" => integer(),
        "float" | "number" => float(),
        "boolean" | "bool" => boolean(),
        "hostname" => hostname(),
        "ip" => ip(),
        "port" => port(),
        "identifier" => identifier(),
        "alphanumeric" | "alnum" => alphanumeric(),
        "nowhitespace" => no_whitespace(),
        "range" => {
            let (lo, hi) = two_numbers(&name, args)?;
            range(lo, hi)
        }
        "min" => min(one_number(args)?),
        "max" => max(one_number(args)?),
        "minlength" | "minlen" => min_length(one_count(args)?),
        "maxlength" | "maxlen" => max_length(one_count(args)?),
        "length" | "len" => length(one_count(args)?),
        "regex" => {
            let (pattern, description) = regex_args(args);
            regex_with_description(&pattern, &description)
        }
        "isoneof" => is_one_of(&plain_args(args)),
        "isnotoneof" => is_not_one_of(&plain_args(args)),
        "fileext" => file_ext(&plain_args(args)),
        "all" => all(parse_list(args, depth + 1)?),
        "any" | "oneof" => any(parse_list(args, depth + 1)?),
        "not" => {
            let mut inner = parse_list(args, depth + 1)?;
            if inner.len() != 1 {
                return Err(ParseError::UnknownValidator { name: format!("not({args})") });
            }
            not(inner.remove(0), format!("not {args}"))
        }
        _ => return Err(ParseError::UnknownValidator { name }),
    };
    Ok(validator)
}

fn plain_args(args: &str) -> Vec<String> {
    split_siblings(args).into_iter().map(|a| a.trim().to_string()).filter(|a| !a.is_empty()).collect()
}

fn one_number(args: &str) -> Result<f64> {
    args.trim().parse::<f64>().map_err(|_| ParseError::InvalidFloat { value: args.trim().to_string() })
}

fn one_count(args: &str) -> Result<usize> {
    args.trim()
        .parse::<usize>()
        .map_err(|_| ParseError::InvalidInteger { value: args.trim().to_string() })
}

fn two_numbers(name: &str, args: &str) -> Result<(f64, f64)> {
    let parts = plain_args(args);
    if parts.len() != 2 {
        return Err(ParseError::UnknownValidator { name: format!("{name}({args})") });
    }
    Ok((
        parts[0].parse::<f64>().map_err(|_| ParseError::InvalidFloat { value: parts[0].clone() })?,
        parts[1].parse::<f64>().map_err(|_| ParseError::InvalidFloat { value: parts[1].clone() })?,
    ))
}

/// Accepts `P`, `pattern:P,desc:D`, and `{pattern:P,desc:D}`.
fn regex_args(args: &str) -> (String, String) {
    let mut body = args.trim();
    if body.starts_with('{') && body.ends_with('}') && body.contains("pattern:") {
        body = body[1..body.len() - 1].trim();
    }
    if let Some(rest) = body.strip_prefix("pattern:") {
        let parts = split_siblings(rest);
        let mut pattern = String::new();
        let mut desc = None;
        for (i, part) in parts.iter().enumerate() {
            let part = part.trim();
            if let Some(d) = part.strip_prefix("desc:") {
                desc = Some(d.trim().to_string());
            } else if i == 0 {
                pattern = part.to_string();
            }
        }
        let desc = desc.unwrap_or_else(|| pattern.clone());
        (pattern, desc)
    } else {
        let pattern = unescape(body);
        (pattern.clone(), pattern)
    }
}

/// Split on top-level commas. Parentheses, braces, and character classes
/// nest; a backslash escapes the following character.
fn split_siblings(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut paren = 0usize;
    let mut brace = 0usize;
    let mut bracket = 0usize;
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(&next) = chars.peek() {
                    if next == ',' {
                        // escaped sibling separator, keep the comma itself
                        current.push(',');
                        chars.next();
                    } else {
                        current.push('\\');
                        current.push(next);
                        chars.next();
                    }
                } else {
                    current.push('\\');
                }
            }
            '[' => {
                bracket += 1;
                current.push(ch);
            }
            ']' => {
                bracket = bracket.saturating_sub(1);
                current.push(ch);
            }
            '(' if bracket == 0 => {
                paren += 1;
                current.push(ch);
            }
            ')' if bracket == 0 => {
                paren = paren.saturating_sub(1);
                current.push(ch);
            }
            '{' if bracket == 0 => {
                brace += 1;
                current.push(ch);
            }
            '}' if bracket == 0 => {
                brace = brace.saturating_sub(1);
                current.push(ch);
            }
            ',' if paren == 0 && brace == 0 && bracket == 0 => {
                out.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn unescape(input: &str) -> String {
    input.replace("\\,", ",")
}
