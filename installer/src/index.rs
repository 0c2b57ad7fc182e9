//! Directory index page parsing.
//!
//! Mirrors expose release folders as plain HTML listings. Only anchor `href`
//! values matter; everything else on the page is ignored. Parsing is
//! deliberately forgiving: unclosed tags, unquoted attributes, and stray
//! markup never abort extraction, they only cause the affected anchor to be
//! skipped.

use crate::naming::ArchiveNaming;
use crate::timestamp::ReleaseTimestamp;
use log::trace;
use regex::Regex;
use std::sync::LazyLock;

/// Matches the `href` attribute of an anchor start tag, quoted or not.
#[expect(clippy::expect_used, reason = "pattern is a literal checked by tests")]
static ANCHOR_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s+(?:[^>]*?\s)?href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'<>]+))"#)
        .expect("anchor pattern compiles")
});

/// Return every anchor `href` in document order, with entities decoded.
///
/// # Examples
///
/// ```
/// use stage3_installer::index::anchor_hrefs;
///
/// let html = r#"<a href="a/">a</a><A HREF='b'>b</A><a href=c>c"#;
/// assert_eq!(anchor_hrefs(html), ["a/", "b", "c"]);
/// ```
#[must_use]
pub fn anchor_hrefs(html: &str) -> Vec<String> {
    ANCHOR_HREF
        .captures_iter(html)
        .filter_map(|captures| {
            captures
                .get(1)
                .or_else(|| captures.get(2))
                .or_else(|| captures.get(3))
        })
        .map(|value| decode_entities(value.as_str()))
        .collect()
}

/// Extract the anchor hrefs accepted by `select`.
///
/// `select` may rewrite the href it accepts (for example to strip a trailing
/// separator). Output follows document order and keeps duplicates.
pub fn extract_matching<F>(html: &str, mut select: F) -> Vec<String>
where
    F: FnMut(&str) -> Option<String>,
{
    anchor_hrefs(html)
        .into_iter()
        .filter_map(|href| {
            let selected = select(&href);
            if selected.is_none() {
                trace!("index: skipping href {href:?}");
            }
            selected
        })
        .collect()
}

/// Extract timestamp-named release folders from an index page.
///
/// A single trailing `/` is removed before validation.
///
/// ```
/// use stage3_installer::index::folder_entries;
///
/// let html = r#"
///     <a href="20240101T000000Z/">20240101T000000Z/</a>
///     <a href="not-a-date/">not-a-date/</a>
///     <a href="20240601T120000Z/">20240601T120000Z/</a>
/// "#;
/// assert_eq!(folder_entries(html), ["20240101T000000Z", "20240601T120000Z"]);
/// ```
#[must_use]
pub fn folder_entries(html: &str) -> Vec<String> {
    extract_matching(html, |href| {
        let name = href.strip_suffix('/').unwrap_or(href);
        ReleaseTimestamp::is_valid(name).then(|| name.to_owned())
    })
}

/// Extract archive and signature file names from a release folder page.
///
/// Hrefs are kept verbatim.
#[must_use]
pub fn file_entries(html: &str, naming: &ArchiveNaming) -> Vec<String> {
    extract_matching(html, |href| naming.matches(href).then(|| href.to_owned()))
}

/// Decode the handful of character references that show up in listings.
fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_owned();
    }
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const ARCHIVE: &str = "stage3-amd64-hardened-openrc-20240601T120000Z.tar.xz";
    const SIGNATURE: &str = "stage3-amd64-hardened-openrc-20240601T120000Z.tar.xz.asc";

    fn listing(hrefs: &[&str]) -> String {
        let rows: String = hrefs
            .iter()
            .map(|href| format!("<tr><td><a href=\"{href}\">{href}</a></td></tr>\n"))
            .collect();
        format!("<html><body><table>\n{rows}</table></body></html>")
    }

    #[test]
    fn folder_mode_keeps_timestamps_in_document_order() {
        let html = listing(&["20240101T000000Z/", "not-a-date/", "20240601T120000Z/"]);
        assert_eq!(
            folder_entries(&html),
            ["20240101T000000Z", "20240601T120000Z"]
        );
    }

    #[test]
    fn folder_mode_accepts_folders_without_trailing_slash() {
        let html = listing(&["20240101T000000Z", "../", "current-stage3/"]);
        assert_eq!(folder_entries(&html), ["20240101T000000Z"]);
    }

    #[test]
    fn folder_mode_strips_only_one_separator() {
        let html = listing(&["20240101T000000Z//"]);
        assert!(folder_entries(&html).is_empty());
    }

    #[test]
    fn folder_mode_keeps_duplicates() {
        let html = listing(&["20240101T000000Z/", "20240101T000000Z/"]);
        assert_eq!(folder_entries(&html).len(), 2);
    }

    #[test]
    fn file_mode_keeps_only_archive_family() {
        let html = listing(&["readme.txt", ARCHIVE, SIGNATURE]);
        assert_eq!(
            file_entries(&html, &ArchiveNaming::default()),
            [ARCHIVE, SIGNATURE]
        );
    }

    #[test]
    fn file_mode_keeps_hrefs_verbatim() {
        let html = listing(&["stage3-amd64-hardened-openrc-x/", ARCHIVE]);
        assert_eq!(file_entries(&html, &ArchiveNaming::default()), [ARCHIVE]);
    }

    #[rstest]
    #[case::unclosed_anchor(r#"<a href="20240101T000000Z/">"#)]
    #[case::unterminated_tag(r#"<a href="20240101T000000Z/""#)]
    #[case::unquoted(r"<a href=20240101T000000Z/>x</a>")]
    #[case::single_quoted(r"<a href='20240101T000000Z/'>x</a>")]
    #[case::uppercase(r#"<A HREF="20240101T000000Z/">x</A>"#)]
    #[case::attribute_first(r#"<a class="dir" href = "20240101T000000Z/">x</a>"#)]
    #[case::multiline("<a\n  href=\"20240101T000000Z/\"\n>x</a>")]
    fn tolerates_sloppy_markup(#[case] html: &str) {
        assert_eq!(folder_entries(html), ["20240101T000000Z"]);
    }

    #[rstest]
    #[case::no_anchors("<html><body><p>empty</p></body></html>")]
    #[case::anchor_without_href(r#"<a name="top">top</a>"#)]
    #[case::empty_href(r"<a href=>x</a>")]
    #[case::prefixed_attribute(r#"<a data-href="20240101T000000Z/">x</a>"#)]
    #[case::abbr_tag(r#"<abbr href="20240101T000000Z/">x</abbr>"#)]
    #[case::garbage("<<<a <a <a href")]
    fn returns_empty_without_usable_anchors(#[case] html: &str) {
        assert!(folder_entries(html).is_empty());
    }

    #[test]
    fn decodes_entities_in_hrefs() {
        let html = r#"<a href="a&amp;b">x</a>"#;
        assert_eq!(anchor_hrefs(html), ["a&b"]);
    }

    #[test]
    fn extract_matching_applies_rewrites() {
        let html = listing(&["one", "two", "three"]);
        let upper = extract_matching(&html, |href| {
            href.starts_with('t').then(|| href.to_uppercase())
        });
        assert_eq!(upper, ["TWO", "THREE"]);
    }
}
