// src/services/comment_tree.rs
//! Builds the two-level view of a video's comments: top-level comments,
//! each carrying every descendant reply flattened depth-first.

use crate::models::comment::{CommentItem, CommentRow, ReplyItem};
use crate::services::display_time::{format_local, DATETIME};
use std::collections::HashMap;

/// `rows` may come in any order; top-level comments are returned newest first
/// and replies oldest first within each branch.
pub fn build_comment_tree(mut rows: Vec<CommentRow>) -> Vec<CommentItem> {
    rows.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));

    let by_id: HashMap<i32, &CommentRow> = rows.iter().map(|r| (r.id, r)).collect();
    let mut children: HashMap<i32, Vec<&CommentRow>> = HashMap::new();
    let mut roots: Vec<&CommentRow> = Vec::new();

    for row in &rows {
        match row.replied_id {
            Some(parent) if by_id.contains_key(&parent) => {
                children.entry(parent).or_default().push(row)
            }
            Some(_) => {} // parent deleted or on another video
            None => roots.push(row),
        }
    }

    roots.reverse();

    roots
        .into_iter()
        .map(|root| {
            let mut reply_list = Vec::new();
            collect_replies(root.id, &children, &by_id, &mut reply_list);
            CommentItem {
                id: root.id,
                user_name: root.user_name.clone(),
                body: root.body.clone(),
                time: format_local(&root.timestamp, DATETIME),
                user_id: root.user_id,
                reply_list,
            }
        })
        .collect()
}

/// Depth-first, pre-order walk of `parent_id`'s descendants. Uses an explicit
/// stack so reply chain depth is bounded only by memory.
fn collect_replies(
    parent_id: i32,
    children: &HashMap<i32, Vec<&CommentRow>>,
    by_id: &HashMap<i32, &CommentRow>,
    out: &mut Vec<ReplyItem>,
) {
    let mut stack: Vec<&CommentRow> = Vec::new();
    if let Some(replies) = children.get(&parent_id) {
        stack.extend(replies.iter().rev());
    }

    while let Some(reply) = stack.pop() {
        out.push(ReplyItem {
            id: reply.id,
            user_name: reply.user_name.clone(),
            reply_user_name: reply
                .replied_id
                .and_then(|p| by_id.get(&p))
                .map(|p| p.user_name.clone()),
            body: reply.body.clone(),
            time: format_local(&reply.timestamp, DATETIME),
            user_id: reply.user_id,
        });
        if let Some(replies) = children.get(&reply.id) {
            stack.extend(replies.iter().rev());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn row(id: i32, user: &str, replied_id: Option<i32>, minute: i64) -> CommentRow {
        CommentRow {
            id,
            body: format!("comment {}", id),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::minutes(minute),
            user_id: id * 10,
            user_name: user.to_string(),
            movdetail_id: 1,
            replied_id,
        }
    }

    #[test]
    fn test_roots_newest_first_with_flattened_replies() {
        let rows = vec![
            row(1, "ann", None, 0),
            row(2, "bob", None, 5),
            row(3, "cat", Some(1), 1),
            row(4, "dan", Some(3), 2),
            row(5, "eve", Some(1), 3),
        ];

        let tree = build_comment_tree(rows);
        assert_eq!(tree.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 1]);
        assert!(tree[0].reply_list.is_empty());

        let replies = &tree[1].reply_list;
        assert_eq!(replies.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(replies[0].reply_user_name.as_deref(), Some("ann"));
        assert_eq!(replies[1].reply_user_name.as_deref(), Some("cat"));
        assert_eq!(replies[2].reply_user_name.as_deref(), Some("ann"));
        assert_eq!(tree[1].time, "2024-05-01 08:00:00");
    }

    #[test]
    fn test_very_deep_reply_chain() {
        let depth = 200_000;
        let mut rows = vec![row(1, "ann", None, 0)];
        for id in 2..=depth {
            rows.push(row(id, "bob", Some(id - 1), i64::from(id)));
        }

        let tree = build_comment_tree(rows);
        let replies = &tree[0].reply_list;
        assert_eq!(replies.len(), (depth - 1) as usize);
        assert_eq!(replies[0].id, 2);
        assert_eq!(replies.last().map(|r| r.id), Some(depth));
        assert_eq!(replies[0].reply_user_name.as_deref(), Some("ann"));
    }

    #[test]
    fn test_orphaned_replies_are_dropped() {
        let tree = build_comment_tree(vec![row(1, "ann", None, 0), row(9, "zed", Some(42), 1)]);
        assert_eq!(tree.len(), 1);
        assert!(tree[0].reply_list.is_empty());
    }
}
