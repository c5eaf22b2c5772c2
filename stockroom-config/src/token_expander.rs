use std::env;

use {lazy_static::lazy_static, regex::Regex, serde_json::Value, tracing::warn};

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"\$\{([A-Za-z0-9_.\-]+)\}").unwrap();
}

/// Replaces `${path.to.key}` tokens in every string of `config`.
///
/// A token resolves first against a scalar in `config` itself (dotted path),
/// then against an environment variable of the same name. Unresolved tokens
/// are left untouched.
pub fn expand_tokens(config: &Value) -> Value {
    expand_value(config, config)
}

fn expand_value(value: &Value, root: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(expand_str(s, root)),
        Value::Array(items) => Value::Array(items.iter().map(|v| expand_value(v, root)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), expand_value(v, root)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn expand_str(input: &str, root: &Value) -> String {
    TOKEN
        .replace_all(input, |caps: &regex::Captures| {
            let key = &caps[1];
            match lookup(root, key).or_else(|| env::var(key).ok()) {
                Some(resolved) => resolved,
                None => {
                    warn!("Unresolved configuration token: {}", key);
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

fn lookup(root: &Value, dotted: &str) -> Option<String> {
    let found = dotted
        .split('.')
        .try_fold(root, |node, segment| node.get(segment))?;

    match found {
        // Tokens inside the referenced value are not expanded again.
        Value::String(s) if !TOKEN.is_match(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
