//! Link field parsing and push eligibility.

/// A single parsed `Link` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link<'a> {
    /// Root-relative target, without the angle brackets.
    pub path: &'a str,
    /// `rel=preload` was present.
    pub is_preload: bool,
    /// `nopush` was present.
    pub no_push: bool,
}

impl Link<'_> {
    /// Returns true if this link should be considered for push.
    pub fn is_push_candidate(&self) -> bool {
        self.is_preload && !self.no_push
    }
}

/// Split one `Link` header value into its comma separated fields.
pub fn split_fields(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|f| !f.is_empty())
}

/// Parse one `Link` field.
///
/// Returns `None` when the field is not a push candidate shape at all:
/// fewer than two tokens, or a target that is not `</...>` with a
/// single leading slash.
pub fn parse_link(field: &str) -> Option<Link<'_>> {
    let mut tokens = field
        .split(|c: char| c == ';' || c.is_whitespace())
        .filter(|t| !t.is_empty());

    let target = tokens.next()?;
    let mut attributes = tokens.peekable();
    attributes.peek()?;

    let path = root_relative_target(target)?;

    let mut link = Link {
        path,
        is_preload: false,
        no_push: false,
    };
    for attribute in attributes {
        match attribute {
            "rel=preload" | "rel=\"preload\"" => link.is_preload = true,
            "nopush" => {
                link.no_push = true;
                break;
            }
            _ => {}
        }
    }

    Some(link)
}

fn root_relative_target(token: &str) -> Option<&str> {
    let bytes = token.as_bytes();
    if bytes.len() < 4
        || bytes[0] != b'<'
        || bytes[1] != b'/'
        || bytes[2] == b'/'
        || bytes[bytes.len() - 1] != b'>'
    {
        return None;
    }
    Some(&token[1..token.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preload_link() {
        let link = parse_link("</app.js>; rel=preload").unwrap();
        assert_eq!(link.path, "/app.js");
        assert!(link.is_preload);
        assert!(!link.no_push);
        assert!(link.is_push_candidate());

        let quoted = parse_link("</app.css>; rel=\"preload\"; as=style").unwrap();
        assert_eq!(quoted.path, "/app.css");
        assert!(quoted.is_push_candidate());
    }

    #[test]
    fn test_nopush_overrides_preload() {
        let link = parse_link("</b.css>; rel=preload; nopush").unwrap();
        assert!(link.is_preload);
        assert!(link.no_push);
        assert!(!link.is_push_candidate());

        // Order does not matter
        let link = parse_link("</b.css>; nopush; rel=preload").unwrap();
        assert!(!link.is_push_candidate());
    }

    #[test]
    fn test_rejects_non_root_relative_targets() {
        assert!(parse_link("<//evil.com/x>; rel=preload").is_none());
        assert!(parse_link("<https://other.example/x>; rel=preload").is_none());
        assert!(parse_link("<app.js>; rel=preload").is_none());
        assert!(parse_link("</>; rel=preload").is_none());
        assert!(parse_link("</a.js; rel=preload").is_none());
    }

    #[test]
    fn test_requires_attributes() {
        assert!(parse_link("</a.js>").is_none());
        assert!(parse_link("</a.js>;").is_none());
        assert!(parse_link("").is_none());
    }

    #[test]
    fn test_attribute_matching_is_exact() {
        let link = parse_link("</a.js>; rel=Preload").unwrap();
        assert!(!link.is_preload);

        let link = parse_link("</a.js>; rel=prefetch").unwrap();
        assert!(!link.is_push_candidate());

        // Whitespace and semicolons are interchangeable separators
        let link = parse_link("</a.js>   rel=preload").unwrap();
        assert!(link.is_push_candidate());
    }

    #[test]
    fn test_split_fields() {
        let fields: Vec<_> =
            split_fields("</a.js>; rel=preload, </b.css>; rel=preload; nopush,, ").collect();
        assert_eq!(fields, vec!["</a.js>; rel=preload", "</b.css>; rel=preload; nopush"]);
    }
}
