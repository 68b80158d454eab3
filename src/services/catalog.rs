// src/services/catalog.rs
use serde_json::{Map, Value};

/// Upstream CDN hosts that stopped serving, and the host that mirrors them.
const DEAD_CDN_HOSTS: &[&str] = &["v8.qewbn.com", "ts1.yhzybf.com"];
const REPLACEMENT_CDN_HOST: &str = "vod12.wgslsw.com";

/// `type_id`s covered by each browse tab of the catalog.
pub fn type_ids_for_movtype(movtype: i32) -> Option<&'static [i32]> {
    match movtype {
        // anime
        1 => Some(&[30, 31, 32, 22]),
        // movies
        2 => Some(&[6, 7, 9, 10, 11, 12, 20, 21]),
        // series
        3 => Some(&[13, 14, 15, 16, 23, 24, 25]),
        // variety
        4 => Some(&[26, 27, 28]),
        // news
        5 => Some(&[5, 17, 18]),
        0 => Some(&[
            6, 7, 9, 10, 11, 12, 13, 14, 15, 16, 20, 21, 22, 23, 24, 25, 26, 27, 28, 30, 31, 32,
        ]),
        _ => None,
    }
}

/// Maps an admin-entered category name to its `type_id`; unknown names file
/// under movies.
pub fn type_id_for_name(type_name: &str) -> i32 {
    match type_name.trim() {
        "电影" | "movie" => 1,
        "连续剧" | "series" => 2,
        "综艺" | "variety" => 3,
        "动漫" | "anime" => 4,
        "国产剧" => 13,
        "香港剧" => 14,
        "韩国剧" => 16,
        "日本剧" => 23,
        "欧美剧" => 24,
        _ => 1,
    }
}

pub fn strip_markup(content: &str) -> String {
    ["<p>", "</p>", "<span>", "</span>"]
        .iter()
        .fold(content.to_string(), |acc, tag| acc.replace(tag, ""))
}

pub fn replace_dead_cdn(url: &str) -> String {
    DEAD_CDN_HOSTS
        .iter()
        .fold(url.to_string(), |acc, host| acc.replace(host, REPLACEMENT_CDN_HOST))
}

pub fn is_dead_cdn(url: &str) -> bool {
    DEAD_CDN_HOSTS.iter().any(|host| url.contains(host))
}

/// Parses `"ep1$url1#ep2$url2"` into an ordered episode → url map.
/// Entries without exactly one `$` are skipped.
pub fn parse_play_urls(raw: &str) -> Map<String, Value> {
    let mut episodes = Map::new();
    for entry in raw.split('#') {
        let mut parts = entry.split('$');
        if let (Some(name), Some(url), None) = (parts.next(), parts.next(), parts.next()) {
            let url = url.trim();
            if is_dead_cdn(url) {
                tracing::debug!("Rewriting dead CDN host in play url {}", url);
            }
            episodes.insert(name.trim().to_string(), Value::String(replace_dead_cdn(url)));
        }
    }
    episodes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movtype_lookup() {
        assert_eq!(type_ids_for_movtype(4), Some(&[26, 27, 28][..]));
        assert_eq!(type_ids_for_movtype(0).map(|ids| ids.len()), Some(22));
        assert_eq!(type_ids_for_movtype(9), None);
    }

    #[test]
    fn test_play_urls_parse_in_order_and_fix_cdn() {
        let map = parse_play_urls(
            "EP01$https://v8.qewbn.com/a/index.m3u8#EP02$https://ok.example.com/b.m3u8#broken",
        );
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, vec!["EP01", "EP02"]);
        assert_eq!(map["EP01"], "https://vod12.wgslsw.com/a/index.m3u8");
        assert_eq!(map["EP02"], "https://ok.example.com/b.m3u8");
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(strip_markup("<p>Hello <span>world</span></p>"), "Hello world");
    }

    #[test]
    fn test_type_id_defaults_to_movies() {
        assert_eq!(type_id_for_name("动漫"), 4);
        assert_eq!(type_id_for_name("documentary"), 1);
    }
}
