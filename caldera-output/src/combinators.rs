//! Free-function combinators over deferred values.
//!
//! Every combinator lifts its inputs with the metadata join: the result is
//! known when every input is, secret when any input is, and depends on the
//! union of the inputs' resources. Structural failures (a cyclic input, a
//! template that does not match its expressions) surface through the
//! returned Output's rejected fields, so combinator results always compose.

use std::collections::BTreeMap;

use bedrock::{OutputError, Value};

use crate::input::Input;
use crate::lift::lift;
use crate::output::Output;

/// Combine a sequence of inputs into one Output of the sequence of their
/// values.
pub fn all<I>(inputs: impl IntoIterator<Item = I>) -> Output
where
    I: Into<Input>,
{
    let items: Vec<Input> = inputs.into_iter().map(Into::into).collect();
    lift(Input::from(items))
}

/// Combine keyed inputs into one Output of the record of their values.
pub fn all_entries<K, I>(entries: impl IntoIterator<Item = (K, I)>) -> Output
where
    K: Into<String>,
    I: Into<Input>,
{
    let entries: BTreeMap<String, Input> = entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
    lift(Input::from(entries))
}

/// Concatenate the display forms of any number of inputs into one string
/// Output. No inputs yields the known empty string.
pub fn concat<I>(parts: impl IntoIterator<Item = I>) -> Output
where
    I: Into<Input>,
{
    all(parts).apply(|combined| {
        let Value::Array(items) = combined else {
            return Value::String(String::new()).into();
        };
        let mut text = String::new();
        for item in items {
            text.push_str(&item.to_string());
        }
        Value::String(text).into()
    })
}

/// Render a `{}` template with the display forms of the expressions.
///
/// Call sites normally go through the [`crate::interpolate!`] macro:
///
/// ```
/// use caldera_output::Output;
///
/// let host = Output::known("db.internal");
/// let _url = caldera_output::interpolate!("postgres://{}:{}", host, 5432);
/// ```
///
/// A template whose placeholder count does not match the expression count
/// yields an Output whose fields reject with [`OutputError::Template`].
pub fn interpolate(template: &str, expressions: Vec<Input>) -> Output {
    let segments: Vec<String> = template.split("{}").map(str::to_owned).collect();
    let placeholders = segments.len() - 1;
    if placeholders != expressions.len() {
        return Output::poisoned(OutputError::Template(format!(
            "template has {placeholders} placeholders but {} expressions were given",
            expressions.len()
        )));
    }
    all(expressions).apply(move |combined| {
        let Value::Array(values) = combined else {
            return Value::String(segments.concat()).into();
        };
        let mut values = values.into_iter();
        let mut text = String::new();
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                if let Some(value) = values.next() {
                    text.push_str(&value.to_string());
                }
            }
            text.push_str(segment);
        }
        Value::String(text).into()
    })
}

/// Build a string Output from a `{}` template and deferred expressions.
///
/// The deferred analogue of `format!`: expressions may be plain values,
/// Outputs, or anything else that lifts, and the result carries the joined
/// metadata — unknown if any expression is, secret if any expression is.
#[macro_export]
macro_rules! interpolate {
    ($template:expr $(, $expression:expr)* $(,)?) => {
        $crate::combinators::interpolate(
            $template,
            ::std::vec![$($crate::Input::from($expression)),*],
        )
    };
}

/// The JSON encoding of an input's resolved value, as a string Output.
///
/// Secrecy and the transitive resource set carry over from the input. If
/// any descendant of the resolved value is unknown, the result is unknown
/// and no partial JSON is produced.
pub fn json_stringify(value: impl Into<Input>) -> Output {
    stringify(value.into(), false)
}

/// [`json_stringify`] with human-readable indentation.
pub fn json_stringify_pretty(value: impl Into<Input>) -> Output {
    stringify(value.into(), true)
}

fn stringify(input: Input, pretty: bool) -> Output {
    lift(input).try_apply(move |value| {
        if value.contains_unknown() {
            return Ok(Value::Unknown.into());
        }
        let json = value
            .to_json()
            .ok_or_else(|| OutputError::Json("value has no JSON form".into()))?;
        let text = if pretty {
            serde_json::to_string_pretty(&json)
        } else {
            serde_json::to_string(&json)
        }
        .map_err(|e| OutputError::Json(e.to_string()))?;
        Ok(Value::String(text).into())
    })
}

/// Parse a string Output as JSON. Metadata is inherited from the input; a
/// parse failure rejects the result's value and knownness.
pub fn json_parse(text: impl Into<Input>) -> Output {
    lift(text.into()).try_apply(|value| match value {
        Value::String(text) => serde_json::from_str::<serde_json::Value>(&text)
            .map(|json| Input::from(Value::from_json(json)))
            .map_err(|e| OutputError::Json(e.to_string())),
        Value::Unknown => Ok(Value::Unknown.into()),
        other => Err(OutputError::Json(format!(
            "cannot parse a {} as JSON",
            other.kind()
        ))),
    })
}

/// Lift an input and mark it secret.
pub fn secret(value: impl Into<Input>) -> Output {
    lift(value.into()).with_secrecy(true)
}

/// Lift an input and strip its secrecy. The only operation that does.
pub fn unsecret(value: impl Into<Input>) -> Output {
    lift(value.into()).with_secrecy(false)
}

/// Whether an input's lifted form is secret.
pub async fn is_secret(value: impl Into<Input>) -> Result<bool, OutputError> {
    lift(value.into()).is_secret().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use bedrock::{DeployPhase, ResourceId, ResourceSet};
    use crate::phase;

    fn ids(names: &[&str]) -> ResourceSet {
        names.iter().map(|n| ResourceId::from(*n)).collect()
    }

    #[tokio::test]
    async fn all_joins_knownness_and_secrecy() {
        let known = all([
            Input::from(Output::known(1)),
            Input::from(Output::known(2)),
        ]);
        assert_eq!(known.is_known().await.unwrap(), true);
        assert_eq!(known.is_secret().await.unwrap(), false);

        let one_unknown = all([Input::from(Output::known(1)), Input::from(Output::unknown())]);
        assert_eq!(one_unknown.is_known().await.unwrap(), false);

        let one_secret = all([Input::from(Output::known(1)), Input::from(secret(2))]);
        assert_eq!(one_secret.is_known().await.unwrap(), true);
        assert_eq!(one_secret.is_secret().await.unwrap(), true);
    }

    #[tokio::test]
    async fn all_entries_produces_a_record() {
        let out = all_entries([("host", Input::from("db")), ("port", Input::from(5432))]);
        assert_eq!(
            out.value().await.unwrap().unwrap(),
            Value::Object(
                [
                    ("host".to_owned(), Value::from("db")),
                    ("port".to_owned(), Value::from(5432)),
                ]
                .into_iter()
                .collect()
            )
        );
    }

    #[tokio::test]
    async fn concat_coerces_and_joins() {
        let out = concat([
            Input::from("tcp://"),
            Input::from(Output::known("10.0.0.7")),
            Input::from(":"),
            Input::from(8080),
        ]);
        assert_eq!(
            out.value().await.unwrap(),
            Some(Value::from("tcp://10.0.0.7:8080"))
        );
    }

    #[tokio::test]
    async fn concat_of_nothing_is_the_known_empty_string() {
        let out = concat(Vec::<Input>::new());
        assert_eq!(out.value().await.unwrap(), Some(Value::from("")));
        assert_eq!(out.is_known().await.unwrap(), true);
    }

    #[tokio::test]
    async fn concat_of_a_secret_part_is_secret() {
        let out = concat([Input::from("key="), Input::from(secret("s3cr3t"))]);
        assert_eq!(out.is_secret().await.unwrap(), true);
        assert_eq!(out.value().await.unwrap(), Some(Value::from("key=s3cr3t")));
    }

    #[tokio::test]
    async fn interpolate_renders_templates() {
        let host = Output::known("db.internal");
        let url = interpolate!("postgres://{}:{}/app", host, 5432);
        assert_eq!(
            url.value().await.unwrap(),
            Some(Value::from("postgres://db.internal:5432/app"))
        );
    }

    #[tokio::test]
    async fn interpolate_with_no_placeholders_is_the_literal() {
        let out = interpolate!("just text");
        assert_eq!(out.value().await.unwrap(), Some(Value::from("just text")));
    }

    #[tokio::test]
    async fn interpolate_over_an_unknown_is_unknown() {
        let _phase = phase::enter_phase(DeployPhase::Preview);
        let out = interpolate!("addr={}", Output::unknown());
        assert_eq!(out.is_known().await.unwrap(), false);
        assert_eq!(out.value().await.unwrap(), None);
    }

    #[tokio::test]
    async fn interpolate_arity_mismatch_rejects() {
        let out = interpolate("{} and {}", vec![Input::from(1)]);
        assert!(matches!(
            out.value().await.unwrap_err(),
            OutputError::Template(_)
        ));
    }

    #[tokio::test]
    async fn json_stringify_encodes_and_preserves_metadata() {
        let list = crate::input::InputList::new();
        list.push(secret(Output::resolved(0, true, true, ids(&["kms"]))));
        list.push(Output::resolved(1, true, false, ids(&["db"])));

        let out = json_stringify(list);
        assert_eq!(out.value().await.unwrap(), Some(Value::from("[0,1]")));
        assert_eq!(out.is_known().await.unwrap(), true);
        assert_eq!(out.is_secret().await.unwrap(), true);
        assert_eq!(*out.all_resources().await.unwrap(), ids(&["kms", "db"]));
    }

    #[tokio::test]
    async fn json_stringify_of_an_unknown_produces_no_partial_json() {
        let _phase = phase::enter_phase(DeployPhase::Update);
        let list = crate::input::InputList::new();
        list.push(Output::known(1));
        list.push(Output::unknown());

        let out = json_stringify(list);
        assert_eq!(out.is_known().await.unwrap(), false);
        assert_eq!(out.value().await.unwrap(), None);
    }

    #[tokio::test]
    async fn json_stringify_pretty_indents() {
        let config = Value::from_json(serde_json::json!({"replicas": 3}));
        let out = json_stringify_pretty(Output::known(config));
        assert_eq!(
            out.value().await.unwrap(),
            Some(Value::from("{\n  \"replicas\": 3\n}"))
        );
    }

    #[tokio::test]
    async fn json_parse_inverts_stringify() {
        let original = Value::from_json(serde_json::json!({"ports": [80, 443]}));
        let out = json_parse(json_stringify(Output::known(original.clone())));
        assert_eq!(out.value().await.unwrap(), Some(original));
    }

    #[tokio::test]
    async fn json_parse_failure_rejects_value_and_knownness() {
        let out = json_parse("{not json");
        assert!(matches!(out.value().await.unwrap_err(), OutputError::Json(_)));
        assert!(matches!(
            out.is_known().await.unwrap_err(),
            OutputError::Json(_)
        ));
        assert_eq!(out.is_secret().await.unwrap(), false);
    }

    #[tokio::test]
    async fn json_parse_of_a_non_string_rejects() {
        let out = json_parse(Output::known(42));
        assert!(matches!(out.value().await.unwrap_err(), OutputError::Json(_)));
    }

    #[tokio::test]
    async fn unsecret_is_the_inverse_of_secret() {
        let out = unsecret(secret("hunter2"));
        assert_eq!(out.is_secret().await.unwrap(), false);
        assert_eq!(out.value().await.unwrap(), Some(Value::from("hunter2")));
        assert_eq!(is_secret(secret("x")).await.unwrap(), true);
        assert_eq!(is_secret("x").await.unwrap(), false);
    }

    #[tokio::test]
    async fn secret_keeps_the_other_fields_as_lifted() {
        let src = Output::resolved("cidr", false, false, ids(&["vpc"]));
        let out = secret(&src);
        assert_eq!(out.is_secret().await.unwrap(), true);
        assert_eq!(out.is_known().await.unwrap(), false);
        assert_eq!(out.resources(), &ids(&["vpc"]));
    }
}
