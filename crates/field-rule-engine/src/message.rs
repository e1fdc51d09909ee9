//! 失败消息渲染
//!
//! 模板支持命名占位符（`{field}`、`{milestone}` 等）和位置占位符（`{0}`、`{1}` ...），
//! 位置占位符按参数添加顺序编号，`{0}` 始终为字段标签。`{{` 和 `}}` 转义为花括号，
//! 未知占位符原样保留。

/// 消息参数
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessageArgs {
    args: Vec<(&'static str, String)>,
}

impl MessageArgs {
    pub fn new(field_label: impl Into<String>) -> Self {
        Self {
            args: vec![("field", field_label.into())],
        }
    }

    pub fn with(mut self, name: &'static str, value: impl ToString) -> Self {
        self.args.push((name, value.to_string()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    fn positional(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(|(_, value)| value.as_str())
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        match key.parse::<usize>() {
            Ok(index) => self.positional(index),
            Err(_) => self.get(key),
        }
    }
}

/// 渲染模板
pub fn render(template: &str, args: &MessageArgs) -> String {
    let mut output = String::with_capacity(template.len() + 16);
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        output.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            output.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }

        if tail.starts_with('}') {
            output.push('}');
            rest = &tail[1..];
            continue;
        }

        match tail[1..].find('}') {
            Some(end) => {
                let key = &tail[1..=end];
                match args.lookup(key) {
                    Some(value) => output.push_str(value),
                    None => output.push_str(&tail[..end + 2]),
                }
                rest = &tail[end + 2..];
            }
            None => {
                output.push_str(tail);
                rest = "";
            }
        }
    }

    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_placeholders() {
        let args = MessageArgs::new("Age").with("milestone", 18);
        assert_eq!(render("{field} must be at least {milestone}", &args), "Age must be at least 18");
    }

    #[test]
    fn test_positional_placeholders() {
        let args = MessageArgs::new("Tags").with("milestones", "1,2,3");
        assert_eq!(render("{0} must contain {1}", &args), "Tags must contain 1,2,3");
    }

    #[test]
    fn test_escapes_and_unknown() {
        let args = MessageArgs::new("Name");
        assert_eq!(render("{{literal}} {field}", &args), "{literal} Name");
        assert_eq!(render("{field} {unknown} {5}", &args), "Name {unknown} {5}");
        assert_eq!(render("open {field", &args), "open {field");
        assert_eq!(render("close }", &args), "close }");
    }
}
