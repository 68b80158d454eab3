// src/services/collection_list.rs
//! Favorites are persisted as a `;`-terminated id string, e.g. `"12;40;7;"`.

const SEPARATOR: char = ';';

/// Parses the stored string, keeping insertion order and dropping
/// duplicates and non-numeric tokens.
pub fn parse_ids(raw: &str) -> Vec<i32> {
    let mut ids = Vec::new();
    for token in raw.split(SEPARATOR) {
        if let Ok(id) = token.trim().parse::<i32>() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

pub fn serialize_ids(ids: &[i32]) -> String {
    ids.iter().map(|id| format!("{}{}", id, SEPARATOR)).collect()
}

pub fn contains(raw: &str, vod_id: i32) -> bool {
    parse_ids(raw).contains(&vod_id)
}

/// Returns the new stored string, or `None` when the id is already present.
pub fn add(raw: &str, vod_id: i32) -> Option<String> {
    let mut ids = parse_ids(raw);
    if ids.contains(&vod_id) {
        return None;
    }
    ids.push(vod_id);
    Some(serialize_ids(&ids))
}

/// Removes an exact id match; returns the new stored string and remaining ids.
pub fn remove(raw: &str, vod_id: i32) -> (String, Vec<i32>) {
    let ids: Vec<i32> = parse_ids(raw).into_iter().filter(|id| *id != vod_id).collect();
    (serialize_ids(&ids), ids)
}

/// Slice of ids for a 1-based page, plus whether more pages follow.
pub fn page(ids: &[i32], page: i64, per_page: i64) -> (&[i32], bool) {
    let per_page = per_page.max(1) as usize;
    let start = ((page.max(1) - 1) as usize).saturating_mul(per_page);
    if start >= ids.len() {
        return (&[], false);
    }
    let end = (start + per_page).min(ids.len());
    (&ids[start..end], end < ids.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_junk_and_duplicates() {
        assert_eq!(parse_ids("12;40;;x;7;12;"), vec![12, 40, 7]);
        assert!(parse_ids("").is_empty());
        assert_eq!(parse_ids("5"), vec![5]);
    }

    #[test]
    fn test_membership_is_exact() {
        assert!(contains("112;40;", 112));
        assert!(!contains("112;40;", 12));
        assert!(!contains("112;40;", 4));
    }

    #[test]
    fn test_add_is_idempotent() {
        assert_eq!(add("", 3).as_deref(), Some("3;"));
        assert_eq!(add("3;", 9).as_deref(), Some("3;9;"));
        assert_eq!(add("3;9;", 3), None);
    }

    #[test]
    fn test_remove_does_not_touch_longer_ids() {
        let (stored, remaining) = remove("112;12;40;", 12);
        assert_eq!(stored, "112;40;");
        assert_eq!(remaining, vec![112, 40]);

        let (stored, remaining) = remove("5;", 6);
        assert_eq!(stored, "5;");
        assert_eq!(remaining, vec![5]);
    }

    #[test]
    fn test_paging() {
        let ids = vec![1, 2, 3, 4, 5];
        assert_eq!(page(&ids, 1, 2), (&[1, 2][..], true));
        assert_eq!(page(&ids, 3, 2), (&[5][..], false));
        assert_eq!(page(&ids, 4, 2), (&[][..], false));
    }
}
