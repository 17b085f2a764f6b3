//! Rules for how a post's reactions and comments evolve, and how a feed is ordered.
//!
//! Everything here is pure: callers load a post, apply one of these functions and
//! hand the result back to the store.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::DomainError;
use super::post::{Comment, CreatePostRequest, FeedSort, Post, TagCount};
use super::user::User;

/// Comments count double in the popularity score.
pub(crate) const COMMENT_WEIGHT: i64 = 2;

pub(crate) fn create_post(
    username: &str,
    title: &str,
    description: &str,
    tags: &[String],
    now: DateTime<Utc>,
) -> Result<Post, DomainError> {
    let req = CreatePostRequest {
        title: title.to_string(),
        description: description.to_string(),
        tags: tags.to_vec(),
    }
    .validate()?;

    Ok(Post {
        id: Uuid::new_v4(),
        username: username.to_string(),
        title: req.title,
        description: req.description,
        timestamp: now,
        likes: Default::default(),
        dislikes: Default::default(),
        comments: Vec::new(),
        tags: req.tags,
    })
}

pub(crate) fn toggle_like(post: &mut Post, username: &str) {
    if !post.likes.remove(username) {
        post.likes.insert(username.to_string());
        post.dislikes.remove(username);
    }
}

pub(crate) fn toggle_dislike(post: &mut Post, username: &str) {
    if !post.dislikes.remove(username) {
        post.dislikes.insert(username.to_string());
        post.likes.remove(username);
    }
}

/// Appends a comment at the end, so `comments` stays chronological.
pub(crate) fn add_comment(
    post: &mut Post,
    username: &str,
    text: &str,
    now: DateTime<Utc>,
) -> Result<Comment, DomainError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DomainError::Validation {
            field: "text",
            message: "must not be empty",
        });
    }

    let comment = Comment {
        id: Uuid::new_v4(),
        username: username.to_string(),
        text: text.to_string(),
        timestamp: now,
    };
    post.comments.push(comment.clone());
    Ok(comment)
}

pub(crate) fn can_delete(post: &Post, actor: &User) -> bool {
    actor.is_admin || actor.is(&post.username)
}

pub(crate) fn popularity_score(post: &Post) -> i64 {
    post.likes.len() as i64 - post.dislikes.len() as i64
        + post.comments.len() as i64 * COMMENT_WEIGHT
}

pub(crate) fn sort_recent(mut posts: Vec<Post>) -> Vec<Post> {
    posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    posts
}

pub(crate) fn sort_popular(mut posts: Vec<Post>) -> Vec<Post> {
    posts.sort_by(|a, b| {
        popularity_score(b)
            .cmp(&popularity_score(a))
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });
    posts
}

pub(crate) fn sort_feed(posts: Vec<Post>, sort: FeedSort) -> Vec<Post> {
    match sort {
        FeedSort::Recent => sort_recent(posts),
        FeedSort::Popular => sort_popular(posts),
    }
}

/// Case-insensitive substring match over title, description, tags and author.
pub(crate) fn matches_query(post: &Post, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return false;
    }
    post.title.to_lowercase().contains(&query)
        || post.description.to_lowercase().contains(&query)
        || post.tags.iter().any(|tag| tag.contains(&query))
        || post.username.to_lowercase().contains(&query)
}

/// Most used tags first; ties keep the order in which tags first appeared.
pub(crate) fn trending_tags(posts: &[Post], limit: usize) -> Vec<TagCount> {
    let mut counts: Vec<TagCount> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for tag in posts.iter().flat_map(|post| post.tags.iter()) {
        match positions.get(tag.as_str()) {
            Some(&at) => counts[at].count += 1,
            None => {
                positions.insert(tag.as_str(), counts.len());
                counts.push(TagCount {
                    tag: tag.clone(),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

pub(crate) fn interaction_count(post: &Post) -> usize {
    post.likes.len() + post.dislikes.len() + post.comments.len()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;

    #[test]
    fn create_post_rejects_short_title_and_description() {
        let err =
            create_post("alice", "ab", "short", &[], now()).expect_err("must fail validation");
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[test]
    fn create_post_starts_with_empty_interactions() {
        let post = create_post("alice", "Hello", "This is long enough", &[], now())
            .expect("post must be created");

        assert_eq!(post.username, "alice");
        assert!(post.likes.is_empty());
        assert!(post.dislikes.is_empty());
        assert!(post.comments.is_empty());
    }

    #[test]
    fn create_post_assigns_distinct_ids() {
        let a = create_post("alice", "Hello", "This is long enough", &[], now()).expect("valid");
        let b = create_post("alice", "Hello", "This is long enough", &[], now()).expect("valid");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn like_then_dislike_leaves_only_dislike() {
        let mut post = sample_post("bob", 0);

        toggle_like(&mut post, "alice");
        toggle_dislike(&mut post, "alice");

        assert!(post.dislikes.contains("alice"));
        assert!(!post.likes.contains("alice"));
    }

    #[test]
    fn dislike_then_like_leaves_only_like() {
        let mut post = sample_post("bob", 0);

        toggle_dislike(&mut post, "alice");
        toggle_like(&mut post, "alice");

        assert!(post.likes.contains("alice"));
        assert!(!post.dislikes.contains("alice"));
    }

    #[test]
    fn double_like_restores_original_state() {
        let mut post = sample_post("bob", 0);
        post.likes.insert("carol".to_string());

        toggle_like(&mut post, "alice");
        toggle_like(&mut post, "alice");

        assert!(!post.likes.contains("alice"));
        assert!(!post.dislikes.contains("alice"));
        assert!(post.likes.contains("carol"));
    }

    #[test]
    fn toggles_never_overlap_likes_and_dislikes() {
        let mut post = sample_post("bob", 0);
        let users = ["alice", "carol", "dave"];

        for step in 0..30 {
            let user = users[step % users.len()];
            if step % 3 == 0 {
                toggle_like(&mut post, user);
            } else {
                toggle_dislike(&mut post, user);
            }
            assert!(post.likes.is_disjoint(&post.dislikes));
        }
    }

    #[test]
    fn add_comment_appends_in_order() {
        let mut post = sample_post("bob", 0);

        let first = add_comment(&mut post, "alice", "  first  ", now()).expect("valid comment");
        let second = add_comment(&mut post, "carol", "second", now()).expect("valid comment");

        assert_eq!(first.text, "first");
        assert_eq!(post.comments.len(), 2);
        assert_eq!(post.comments[0], first);
        assert_eq!(post.comments[1], second);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn add_comment_rejects_blank_text() {
        let mut post = sample_post("bob", 0);

        let err = add_comment(&mut post, "alice", "   ", now()).expect_err("blank comment");
        assert!(matches!(err, DomainError::Validation { field: "text", .. }));
        assert!(post.comments.is_empty());
    }

    #[test]
    fn can_delete_allows_author_and_admin_only() {
        let post = sample_post("bob", 0);

        let author = User::new("Bob", false, now()).expect("valid user");
        let admin = User::new("admin", true, now()).expect("valid user");
        let stranger = User::new("mallory", false, now()).expect("valid user");

        assert!(can_delete(&post, &author));
        assert!(can_delete(&post, &admin));
        assert!(!can_delete(&post, &stranger));
    }

    #[test]
    fn score_weights_comments_twice() {
        let mut post = sample_post("bob", 0);
        post.likes.insert("a".to_string());
        post.likes.insert("b".to_string());
        post.dislikes.insert("c".to_string());
        add_comment(&mut post, "d", "nice", now()).expect("valid comment");

        assert_eq!(popularity_score(&post), 2 - 1 + 2);
    }

    #[test]
    fn sort_recent_orders_by_timestamp_desc_and_keeps_ties_stable() {
        let mut tie_a = sample_post("a", 10);
        tie_a.title = "tie-a".to_string();
        let mut tie_b = sample_post("b", 10);
        tie_b.title = "tie-b".to_string();
        let posts = vec![sample_post("old", 0), tie_a, tie_b, sample_post("new", 20)];

        let sorted = sort_recent(posts);

        let titles: Vec<_> = sorted.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["new", "tie-a", "tie-b", "old"]);
        assert!(sorted.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn sort_popular_orders_by_score_then_recency() {
        let mut liked = sample_post("liked", 0);
        liked.likes.insert("x".to_string());

        let mut commented_old = sample_post("commented_old", 1);
        add_comment(&mut commented_old, "x", "hi", now()).expect("valid comment");

        let mut commented_new = sample_post("commented_new", 5);
        add_comment(&mut commented_new, "y", "hey", now()).expect("valid comment");

        let mut disliked = sample_post("disliked", 9);
        disliked.dislikes.insert("x".to_string());

        let sorted = sort_popular(vec![
            liked,
            disliked,
            commented_old,
            commented_new,
        ]);

        let titles: Vec<_> = sorted.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["commented_new", "commented_old", "liked", "disliked"]);
        assert!(
            sorted
                .windows(2)
                .all(|w| popularity_score(&w[0]) >= popularity_score(&w[1]))
        );
    }

    #[test]
    fn sort_feed_is_a_permutation() {
        let posts: Vec<_> = (0..6).map(|i| sample_post("p", i * 3 % 5)).collect();
        let mut ids: Vec<_> = posts.iter().map(|p| p.id).collect();

        let mut sorted_ids: Vec<_> = sort_feed(posts, FeedSort::Popular)
            .iter()
            .map(|p| p.id)
            .collect();

        ids.sort();
        sorted_ids.sort();
        assert_eq!(ids, sorted_ids);
    }

    #[test]
    fn matches_query_checks_title_description_and_author() {
        let mut post = sample_post("Alice", 0);
        post.title = "Rust tips".to_string();
        post.description = "Borrow checker tricks".to_string();

        assert!(matches_query(&post, "rust"));
        assert!(matches_query(&post, "CHECKER"));
        assert!(matches_query(&post, "alice"));
        assert!(!matches_query(&post, "python"));
        assert!(!matches_query(&post, "   "));
    }

    #[test]
    fn create_post_normalizes_tags() {
        let tags = vec!["Rust #async".to_string(), "rust".to_string()];
        let post = create_post("alice", "Hello", "This is long enough", &tags, now())
            .expect("post must be created");

        assert_eq!(post.tags, ["#rust", "#async"]);
        assert!(matches_query(&post, "#ASYNC"));
        assert!(matches_query(&post, "async"));
    }

    #[test]
    fn trending_counts_tags_across_posts() {
        let mut first = sample_post("first", 0);
        first.tags = vec!["#news".to_string(), "#rust".to_string()];
        let mut second = sample_post("second", 1);
        second.tags = vec!["#rust".to_string()];
        let mut third = sample_post("third", 2);
        third.tags = vec!["#music".to_string(), "#rust".to_string()];

        let trending = trending_tags(&[first, second, third], 2);

        let pairs: Vec<_> = trending
            .iter()
            .map(|entry| (entry.tag.as_str(), entry.count))
            .collect();
        assert_eq!(pairs, [("#rust", 3), ("#news", 1)]);
        assert!(trending_tags(&[], 8).is_empty());
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn sample_post(title: &str, minutes: i64) -> Post {
        let mut post = create_post(
            "bob",
            "placeholder",
            "placeholder description",
            &[],
            now() + Duration::minutes(minutes),
        )
        .expect("sample post must be valid");
        post.title = title.to_string();
        post
    }
}
