use serde_json::Value;

/// A displayable image locator pulled out of a provider response:
/// either a URL or an embedded `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference(pub String);

impl ImageReference {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_data_uri(&self) -> bool {
        self.0.starts_with("data:")
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

type Matcher = fn(&Value) -> Option<Vec<ImageReference>>;

// Recognized shapes of `output`, in priority order. First non-empty
// match wins.
const MATCHERS: &[Matcher] = &[direct_list, images_object, single_image];

/// Heuristically reduce an arbitrary provider response to the image
/// references it carries. Returns an empty list when no recognized
/// shape matches; the caller should then show the raw response for
/// debugging.
pub fn extract_image_references(response: &Value) -> Vec<ImageReference> {
    let output = match response.as_object().and_then(|map| map.get("output")) {
        Some(output) => output,
        None => return Vec::new(),
    };

    MATCHERS
        .iter()
        .find_map(|matcher| matcher(output).filter(|refs| !refs.is_empty()))
        .unwrap_or_default()
}

/// Queued-job indicator: `status = "IN_QUEUE"` plus a job id. Queued
/// jobs are terminal here, never polled to completion.
pub fn queued_job(response: &Value) -> Option<&str> {
    if response.get("status").and_then(Value::as_str) == Some("IN_QUEUE") {
        Some(response.get("id").and_then(Value::as_str).unwrap_or("unknown"))
    } else {
        None
    }
}

fn collect_references(values: &[Value]) -> Vec<ImageReference> {
    // Null and non-string entries are skipped, not errors.
    values
        .iter()
        .filter_map(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(|s| ImageReference(s.to_string()))
        .collect()
}

fn direct_list(output: &Value) -> Option<Vec<ImageReference>> {
    output.as_array().map(|list| collect_references(list))
}

fn images_object(output: &Value) -> Option<Vec<ImageReference>> {
    output
        .as_object()?
        .get("images")?
        .as_array()
        .map(|list| collect_references(list))
}

fn single_image(output: &Value) -> Option<Vec<ImageReference>> {
    let image = output.as_object()?.get("image")?.as_str()?;
    if image.is_empty() {
        return None;
    }
    Some(vec![ImageReference(image.to_string())])
}
