// src/services/m3u8.rs
//! HLS playlist rewriting so every segment, key and nested playlist is
//! fetched back through this server's proxy routes.

use reqwest::Url;

pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

const PLAYLIST_PROXY_PATH: &str = "/vod/proxy/m3u8";
const FILE_PROXY_PATH: &str = "/vod/proxy/file";

/// Absolute URLs are only proxied when they point at media we know.
const PROXIED_EXTENSIONS: &[&str] = &[".ts", ".m3u8", ".jpeg", ".jpg", ".png", ".key", ".m4s", ".mp4"];

/// Content type for a proxied file, from its path extension.
pub fn content_type_for(url: &str) -> &'static str {
    let path = path_without_query(url).to_ascii_lowercase();
    if path.ends_with(".ts") {
        "video/mp2t"
    } else if path.ends_with(".m3u8") {
        PLAYLIST_CONTENT_TYPE
    } else if path.ends_with(".jpeg") || path.ends_with(".jpg") {
        "image/jpeg"
    } else if path.ends_with(".png") {
        "image/png"
    } else if path.ends_with(".mp4") || path.ends_with(".m4s") {
        "video/mp4"
    } else {
        "application/octet-stream"
    }
}

fn path_without_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

fn is_playlist(url: &str) -> bool {
    path_without_query(url).to_ascii_lowercase().ends_with(".m3u8")
}

/// Local proxy URL for an absolute upstream URL.
pub fn proxied(absolute: &str) -> String {
    let route = if is_playlist(absolute) {
        PLAYLIST_PROXY_PATH
    } else {
        FILE_PROXY_PATH
    };
    format!("{}?url={}", route, urlencoding::encode(absolute))
}

/// Resolves `reference` against the playlist URL. Root-relative references
/// keep only scheme and host; others resolve against the playlist directory.
pub fn resolve(reference: &str, base: &Url) -> Option<String> {
    base.join(reference).ok().map(|u| u.to_string())
}

fn rewrite_uri(reference: &str, base: &Url) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    if reference.starts_with("http://") || reference.starts_with("https://") {
        let lower = path_without_query(reference).to_ascii_lowercase();
        if PROXIED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            return Some(proxied(reference));
        }
        return None;
    }
    resolve(reference, base).map(|absolute| proxied(&absolute))
}

/// Rewrites `URI="..."` attributes inside a tag line (keys, maps, media).
fn rewrite_tag_line(line: &str, base: &Url) -> String {
    const MARKER: &str = "URI=\"";
    let mut result = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(start) = rest.find(MARKER) {
        let value_start = start + MARKER.len();
        let Some(len) = rest[value_start..].find('"') else {
            break;
        };
        let value = &rest[value_start..value_start + len];
        result.push_str(&rest[..value_start]);
        match rewrite_uri(value, base) {
            Some(rewritten) => result.push_str(&rewritten),
            None => result.push_str(value),
        }
        rest = &rest[value_start + len..];
    }
    result.push_str(rest);
    result
}

/// Rewrites a playlist fetched from `playlist_url`.
pub fn rewrite_playlist(content: &str, playlist_url: &str) -> Result<String, String> {
    let base = Url::parse(playlist_url).map_err(|e| format!("Invalid playlist URL: {}", e))?;

    let lines: Vec<String> = content
        .split('\n')
        .map(|raw| {
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() {
                line.to_string()
            } else if line.starts_with('#') {
                if line.contains("URI=\"") {
                    rewrite_tag_line(line, &base)
                } else {
                    line.to_string()
                }
            } else {
                rewrite_uri(line, &base).unwrap_or_else(|| line.to_string())
            }
        })
        .collect();

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://cdn.example.com/hls/show/index.m3u8";

    #[test]
    fn test_relative_segments_go_through_file_proxy() {
        let playlist = "#EXTM3U\n#EXTINF:10.0,\nseg-001.ts\n#EXTINF:10.0,\n/abs/seg-002.ts\n#EXT-X-ENDLIST";
        let out = rewrite_playlist(playlist, BASE).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "#EXTM3U");
        assert_eq!(
            lines[2],
            "/vod/proxy/file?url=https%3A%2F%2Fcdn.example.com%2Fhls%2Fshow%2Fseg-001.ts"
        );
        assert_eq!(
            lines[4],
            "/vod/proxy/file?url=https%3A%2F%2Fcdn.example.com%2Fabs%2Fseg-002.ts"
        );
        assert_eq!(lines[5], "#EXT-X-ENDLIST");
    }

    #[test]
    fn test_nested_playlists_go_through_playlist_proxy() {
        let playlist = "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=800000\n720p/index.m3u8";
        let out = rewrite_playlist(playlist, BASE).unwrap();
        assert!(out.ends_with(
            "/vod/proxy/m3u8?url=https%3A%2F%2Fcdn.example.com%2Fhls%2Fshow%2F720p%2Findex.m3u8"
        ));
    }

    #[test]
    fn test_absolute_urls_only_proxied_for_media() {
        let playlist = "https://other.example.com/a.ts\nhttps://other.example.com/landing";
        let out = rewrite_playlist(playlist, BASE).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("/vod/proxy/file?url=https%3A%2F%2Fother.example.com"));
        assert_eq!(lines[1], "https://other.example.com/landing");
    }

    #[test]
    fn test_key_uri_attribute_is_rewritten() {
        let playlist = "#EXT-X-KEY:METHOD=AES-128,URI=\"key.key\",IV=0x1";
        let out = rewrite_playlist(playlist, BASE).unwrap();
        assert_eq!(
            out,
            "#EXT-X-KEY:METHOD=AES-128,URI=\"/vod/proxy/file?url=https%3A%2F%2Fcdn.example.com%2Fhls%2Fshow%2Fkey.key\",IV=0x1"
        );
    }

    #[test]
    fn test_crlf_and_blank_lines_survive() {
        let out = rewrite_playlist("#EXTM3U\r\n\r\nseg.ts\r\n", BASE).unwrap();
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines[0], "#EXTM3U");
        assert_eq!(lines[1], "");
        assert!(lines[2].starts_with("/vod/proxy/file?url="));
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("https://x/y/seg.ts?token=1"), "video/mp2t");
        assert_eq!(content_type_for("https://x/y/index.M3U8"), PLAYLIST_CONTENT_TYPE);
        assert_eq!(content_type_for("https://x/y/cover.jpg"), "image/jpeg");
        assert_eq!(content_type_for("https://x/y/blob"), "application/octet-stream");
    }

    #[test]
    fn test_invalid_playlist_url_is_an_error() {
        assert!(rewrite_playlist("#EXTM3U", "not a url").is_err());
    }
}
