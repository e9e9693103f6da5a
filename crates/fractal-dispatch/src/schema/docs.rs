//! Parsing of structured method documentation.
//!
//! Documentation is a free-text summary, a line holding only `---`, and a
//! YAML document. The YAML must be a mapping with an `Args` key (matched
//! case-insensitively) whose value maps parameter names to descriptions.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::RegistrationError;

const SEPARATOR: &str = "---";

/// Documentation split into its summary and argument descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedDoc {
    pub(crate) summary: Option<String>,
    pub(crate) args: BTreeMap<String, String>,
}

/// Normalises indentation the way docstrings are conventionally cleaned.
///
/// The first line loses its leading whitespace, following lines lose their
/// common indentation, and blank lines at either end are dropped.
pub(crate) fn clean(doc: &str) -> String {
    let mut lines = doc.lines();
    let first = lines.next().map(str::trim_start).unwrap_or_default();
    let rest: Vec<&str> = lines.collect();
    let margin = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = Vec::with_capacity(rest.len() + 1);
    cleaned.push(first.trim_end());
    cleaned.extend(rest.iter().map(|line| {
        let trimmed = line.trim_end();
        trimmed.get(margin..).unwrap_or_else(|| trimmed.trim_start())
    }));

    while cleaned.last().is_some_and(|line| line.is_empty()) {
        cleaned.pop();
    }
    let leading = cleaned.iter().take_while(|line| line.is_empty()).count();
    cleaned.split_off(leading).join("\n")
}

/// Splits cleaned documentation at the first separator line.
fn split(doc: &str) -> (&str, Option<&str>) {
    let mut offset = 0;
    for line in doc.split_inclusive('\n') {
        if line.trim() == SEPARATOR {
            let summary = doc.get(..offset).unwrap_or_default();
            let remainder = doc.get(offset + line.len()..).unwrap_or_default();
            return (summary, Some(remainder));
        }
        offset += line.len();
    }
    (doc, None)
}

/// Parses the documentation of the method `method` taking `params`.
///
/// The YAML part is only required, and only parsed, when the method takes
/// parameters.
pub(crate) fn parse(
    method: &str,
    doc: Option<&str>,
    params: &[&str],
) -> Result<ParsedDoc, RegistrationError> {
    let cleaned = doc.map(clean).unwrap_or_default();
    if cleaned.is_empty() {
        return Err(RegistrationError::MissingDocstring {
            method: method.to_owned(),
        });
    }

    let (head, remainder) = split(&cleaned);
    let summary = Some(head.trim())
        .filter(|text| !text.is_empty())
        .map(str::to_owned);
    if params.is_empty() {
        return Ok(ParsedDoc {
            summary,
            args: BTreeMap::new(),
        });
    }

    let missing_args = || RegistrationError::MissingArgsSection {
        method: method.to_owned(),
    };
    let structured = remainder
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(missing_args)?;
    let document: Value = serde_saphyr::from_str(structured).map_err(|error| {
        RegistrationError::MalformedDocumentation {
            method: method.to_owned(),
            message: error.to_string(),
        }
    })?;
    let section = document
        .as_object()
        .and_then(|mapping| {
            mapping
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("args"))
                .map(|(_, value)| value)
        })
        .ok_or_else(missing_args)?;

    let args = describe(method, section)?;
    let missing: Vec<String> = params
        .iter()
        .filter(|param| !args.contains_key(**param))
        .map(|param| (*param).to_owned())
        .collect();
    if !missing.is_empty() {
        return Err(RegistrationError::UndocumentedArgument {
            method: method.to_owned(),
            missing,
        });
    }
    for extra in args.keys().filter(|key| !params.contains(&key.as_str())) {
        tracing::warn!(method, argument = %extra, "documented argument is not a parameter");
    }
    Ok(ParsedDoc { summary, args })
}

/// Reads the `Args` mapping into name/description pairs.
fn describe(method: &str, section: &Value) -> Result<BTreeMap<String, String>, RegistrationError> {
    let entries = match section {
        Value::Null => return Ok(BTreeMap::new()),
        Value::Object(entries) => entries,
        Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Array(_) => {
            return Err(RegistrationError::MalformedDocumentation {
                method: method.to_owned(),
                message: String::from("'Args' must map argument names to descriptions"),
            });
        }
    };
    entries
        .iter()
        .map(|(name, description)| {
            description
                .as_str()
                .map(|text| (name.clone(), text.trim().to_owned()))
                .ok_or_else(|| RegistrationError::InvalidArgDescription {
                    method: method.to_owned(),
                    argument: name.clone(),
                })
        })
        .collect()
}
