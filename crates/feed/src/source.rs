// ABOUTME: Feed source construction from configured URLs and newline-delimited feed lists.
// ABOUTME: Derives a human display name from the URL host and the site origin for linking.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::models::FeedSource;
use crate::origin_of;

static HOST_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(www\.|feeds\.|feed\.|rss\.)").expect("valid host prefix regex"));

static TLD_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(com|net|org|io|co|me|info)$").expect("valid suffix regex"));

static SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-_]").expect("valid separator regex"));

static CAMEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])([A-Z])").expect("valid camel regex"));

impl FeedSource {
    /// Builds a source for a configured feed URL.
    pub fn from_url(url: &str) -> Self {
        Self {
            url: url.to_string(),
            display_name: display_name(url),
            origin_url: origin_of(url),
        }
    }
}

/// Best-effort label for a feed URL, falling back to the URL itself.
///
/// `https://www.questionable-content.net/QCRSS.xml` becomes
/// `"Questionable Content"`; `https://feeds.feedburner.com/XkcdComic`
/// becomes `"Xkcd Comic"`.
pub fn display_name(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let Some(host) = parsed.host_str() else {
        return url.to_string();
    };

    let mut name = HOST_PREFIX_RE.replace(host, "").into_owned();

    if name.contains("feedburner.com") {
        if let Some(last) = parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        {
            name = last.to_string();
        }
    }

    if name.contains("blogspot.com") {
        name = name.replacen(".blogspot.com", "", 1);
    }

    name = TLD_SUFFIX_RE.replace(&name, "").into_owned();
    name = SEPARATOR_RE.replace_all(&name, " ").into_owned();
    name = CAMEL_RE.replace_all(&name, "$1 $2").into_owned();

    let titled = name.split(' ').map(title_case).collect::<Vec<_>>().join(" ");

    if titled.is_empty() {
        url.to_string()
    } else {
        titled
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Parses a newline-delimited feed list, one URL per line.
/// Lines are trimmed, blank lines skipped, and input order is kept.
pub fn parse_feed_list(text: &str) -> Vec<FeedSource> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(FeedSource::from_url)
        .collect()
}

/// Sorts sources alphabetically by display name, ignoring case.
pub fn sort_by_display_name(sources: &mut [FeedSource]) {
    sources.sort_by_cached_key(|source| source.display_name.to_lowercase());
}
