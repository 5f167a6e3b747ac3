use crate::ConfigParamConfig;
use crate::KeyError;

/// Renders `{placeholder}` occurrences in `template` from `param`.
///
/// Placeholders accept the camelCase and snake_case spelling of each field.
/// `{{` and `}}` escape literal braces.
pub(crate) fn render(
    template: &str,
    param: &ConfigParamConfig,
) -> Result<String, KeyError> {
    let mut out = String::with_capacity(template.len() + 32);
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    if n == '{' {
                        break;
                    }
                    name.push(n);
                }
                if !closed {
                    return Err(KeyError::UnbalancedBraces(template.to_string()));
                }
                out.push_str(lookup(template, name.trim(), param)?);
            }
            '}' => return Err(KeyError::UnbalancedBraces(template.to_string())),
            _ => out.push(c),
        }
    }

    if out.is_empty() {
        return Err(KeyError::EmptyRender(template.to_string()));
    }
    Ok(out)
}

fn lookup<'a>(
    template: &str,
    name: &str,
    param: &'a ConfigParamConfig,
) -> Result<&'a str, KeyError> {
    match name {
        "category" | "Category" => Ok(&param.category),
        "clientServiceName" | "client_service_name" | "ClientServiceName" => {
            Ok(&param.client_service_name)
        }
        "serverServiceName" | "server_service_name" | "ServerServiceName" => {
            Ok(&param.server_service_name)
        }
        _ => Err(KeyError::UnknownPlaceholder {
            template: template.to_string(),
            placeholder: name.to_string(),
        }),
    }
}
