//! Deep links that open a group out-of-band
//!
//! Format: `link-groups://open?groupId=<id>`

use url::{form_urlencoded, Url};

/// URL scheme of deep links
pub const SCHEME: &str = "link-groups";

const OPEN_HOST: &str = "open";
const GROUP_ID_PARAM: &str = "groupId";

/// Build the deep link that opens every link of `group_id`
///
/// # Example
/// ```
/// use link_groups::links::deeplink::open_group_link;
///
/// assert_eq!(open_group_link("abc"), "link-groups://open?groupId=abc");
/// ```
pub fn open_group_link(group_id: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(GROUP_ID_PARAM, group_id)
        .finish();
    format!("{}://{}?{}", SCHEME, OPEN_HOST, query)
}

/// Resolve a group id from either a bare id or an open-group deep link
///
/// Returns `None` for blank input and for deep links without a `groupId`.
pub fn resolve_group_id(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    match Url::parse(trimmed) {
        Ok(url) if url.scheme() == SCHEME => {
            if url.host_str() != Some(OPEN_HOST) {
                return None;
            }
            url.query_pairs()
                .find(|(k, _)| k == GROUP_ID_PARAM)
                .map(|(_, v)| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        _ => Some(trimmed.to_string()),
    }
}
