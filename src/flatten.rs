use crate::{backend::RawScanDocument, config::Schema, record::FlatRecord};
use serde_json::{Map, Value};

/// Turns a scan-details document into one flat row.
///
/// Only two levels under the reports key are read: categories, then the
/// tests inside each category. A category that is not an object is skipped,
/// and so is any entry inside a category that is not an object carrying a
/// score. Anything below the test level is never visited. When two
/// categories produce the same metric name the later one wins.
pub fn flatten(doc: &RawScanDocument, schema: &Schema) -> FlatRecord {
    let mut out = FlatRecord::new();

    let Some(result) = doc
        .value()
        .get(&schema.result_key)
        .and_then(Value::as_object)
        .filter(|r| !r.is_empty())
    else {
        return out;
    };

    out.insert(
        schema.status_key.clone(),
        field_or_blank(doc.value().as_object(), &schema.status_key),
    );
    for key in [
        &schema.verdict_key,
        &schema.score_key,
        &schema.platform_key,
        &schema.elements_key,
        &schema.duration_key,
    ] {
        out.insert(key.clone(), field_or_blank(Some(result), key));
    }

    let Some(reports) = result.get(&schema.reports_key).and_then(Value::as_object) else {
        return out;
    };

    for (category, data) in reports {
        let Some(data) = data.as_object() else {
            continue;
        };
        out.insert(
            format!("{category}_{}", schema.verdict_key),
            field_or_blank(Some(data), &schema.verdict_key),
        );
        out.insert(
            format!("{category}_{}", schema.score_key),
            field_or_blank(Some(data), &schema.score_key),
        );

        for (test, test_data) in data {
            let Some(test_data) = test_data
                .as_object()
                .filter(|t| t.contains_key(&schema.score_key))
            else {
                continue;
            };
            for key in [&schema.score_key, &schema.failures_key, &schema.successes_key] {
                out.insert(
                    format!("{category}_{test}_{key}"),
                    field_or_blank(Some(test_data), key),
                );
            }
        }
    }

    out
}

fn field_or_blank(obj: Option<&Map<String, Value>>, key: &str) -> Value {
    obj.and_then(|o| o.get(key))
        .cloned()
        .unwrap_or_else(|| Value::String(String::new()))
}
