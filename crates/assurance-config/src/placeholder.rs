use std::collections::HashMap;

/// 替换文本中的 `{NAME}` 占位符
///
/// `{{` 和 `}}` 输出字面花括号；未知的名称或不成对的花括号返回错误信息
pub fn expand_placeholders(text: &str, vars: &HashMap<String, String>) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => {
                            return Err(format!("unterminated placeholder '{{{}'", name));
                        }
                        Some(ch) => name.push(ch),
                    }
                }
                let value = vars
                    .get(name.trim())
                    .ok_or_else(|| format!("unknown placeholder '{{{}}}'", name))?;
                out.push_str(value);
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err("single '}' encountered".to_string()),
            other => out.push(other),
        }
    }

    Ok(out)
}
