use serde::Serialize;
use serde_json::Value;

/// A submission attachment reduced to the uniform `{type, title, link}` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub title: String,
    pub link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttachmentKind {
    #[serde(rename = "driveFile")]
    DriveFile,
    #[serde(rename = "link")]
    Link,
    #[serde(rename = "form")]
    Form,
}

const UNTITLED_LINK: &str = "Untitled Link";

/// Maps raw Classroom attachment records to the uniform shape, preserving
/// order. Variants other than driveFile/link/form are dropped without error;
/// callers must expect the output to be shorter than the input.
pub fn normalize(raw: &[Value]) -> Vec<Attachment> {
    let mut out = Vec::new();
    for attachment in raw {
        if let Some(file) = attachment.get("driveFile") {
            let Some(link) = str_field(file, "alternateLink") else {
                continue;
            };
            out.push(Attachment {
                kind: AttachmentKind::DriveFile,
                title: str_field(file, "title").unwrap_or_default(),
                link,
            });
        } else if let Some(link) = attachment.get("link") {
            let Some(url) = str_field(link, "url") else {
                continue;
            };
            out.push(Attachment {
                kind: AttachmentKind::Link,
                title: str_field(link, "title").unwrap_or_else(|| UNTITLED_LINK.to_string()),
                link: url,
            });
        } else if let Some(form) = attachment.get("form") {
            let Some(url) = str_field(form, "formUrl") else {
                continue;
            };
            out.push(Attachment {
                kind: AttachmentKind::Form,
                title: str_field(form, "title").unwrap_or_default(),
                link: url,
            });
        }
    }
    out
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(|t| t.as_str()).map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_all_three_variants() {
        let raw = vec![
            json!({ "driveFile": { "title": "Essay.pdf", "alternateLink": "https://drive/x" } }),
            json!({ "link": { "url": "https://example.com" } }),
            json!({ "form": { "title": "Quiz", "formUrl": "https://forms/q" } }),
        ];
        let out = normalize(&raw);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].kind, AttachmentKind::DriveFile);
        assert_eq!(out[0].title, "Essay.pdf");
        assert_eq!(out[1].title, UNTITLED_LINK);
        assert_eq!(out[2].link, "https://forms/q");
    }

    #[test]
    fn drops_unrecognized_variants_and_keeps_order() {
        let raw = vec![
            json!({ "youTubeVideo": { "id": "abc" } }),
            json!({ "link": { "title": "First", "url": "https://a" } }),
            json!({ "somethingElse": {} }),
            json!({ "link": { "title": "Second", "url": "https://b" } }),
        ];
        let out = normalize(&raw);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "First");
        assert_eq!(out[1].title, "Second");
    }
}
