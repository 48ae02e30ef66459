//! Directory listing parser
//!
//! Extracts child links from the HTML index pages the server generates for
//! each directory. This is deliberately not an HTML parser: listings are
//! expected to carry one `<li><a href="...">...</a></li>` item per line, and
//! anything else is ignored.

use regex::Regex;
use std::sync::OnceLock;

fn listing_item() -> &'static Regex {
    static LISTING_ITEM: OnceLock<Regex> = OnceLock::new();
    LISTING_ITEM.get_or_init(|| {
        Regex::new(r#"<li><a href="([^"]+)">.*</a></li>"#).expect("listing pattern is valid")
    })
}

/// Extracts the relative child links of a directory listing
///
/// Lines without a list-item anchor are skipped, as are absolute links
/// (starting with `/`, e.g. the parent directory entry). Links are returned
/// exactly as written, in document order.
///
/// # Example
///
/// ```
/// use datecrawl::crawler::extract_links;
///
/// let body = "<ul>\n<li><a href=\"/gd2/\"> Parent Directory</a></li>\n\
///             <li><a href=\"gid_1/\"> gid_1/</a></li>\n</ul>";
/// assert_eq!(extract_links(body), vec!["gid_1/"]);
/// ```
pub fn extract_links(body: &str) -> Vec<String> {
    let re = listing_item();

    body.split('\n')
        .filter_map(|line| re.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|href| !href.starts_with('/'))
        .map(str::to_string)
        .collect()
}
