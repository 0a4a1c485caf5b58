//! In-process engine for the catalog, ledger and identity store
//!
//! Each media item owns a mutex guarding its record, its like set and its comments, so a
//! like or comment and the counter it moves always change under the same lock. Operations on
//! different media never contend. Ids and timestamps come from one sequence, so `created_at`
//! never decreases as ids grow.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use photoshare_core::models::{
    can_delete_comment, is_after, newest_first, Comment, LikeResult, Media, NewMedia, Page,
    PageRequest, Paginated, User,
};
use photoshare_core::validation::normalize_comment_text;
use photoshare_core::{AppError, FeedConfig};
use tokio::sync::{Mutex, RwLock};

use super::catalog::MediaCatalog;
use super::identity::IdentityStore;
use super::ledger::{clamp_decrement, EngagementLedger};

type SortKey = (DateTime<Utc>, i64);

#[derive(Default)]
struct Sequences {
    user_id: i64,
    media_id: i64,
    comment_id: i64,
    like_seq: i64,
    last_stamp: Option<DateTime<Utc>>,
}

impl Sequences {
    fn next(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let at = match self.last_stamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_stamp = Some(at);
        at
    }
}

struct MediaEntry {
    key: SortKey,
    state: Mutex<MediaState>,
}

struct MediaState {
    media: Media,
    /// user id -> (liked at, like sequence)
    likes: HashMap<i64, SortKey>,
    comments: BTreeMap<i64, Comment>,
}

struct Inner {
    open_registration: bool,
    comment_max_length: usize,
    sequences: Mutex<Sequences>,
    users: RwLock<BTreeMap<i64, User>>,
    media: RwLock<BTreeMap<i64, Arc<MediaEntry>>>,
}

#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl InMemoryStore {
    /// Only users created through [`IdentityStore::create_user`] resolve.
    pub fn new(config: &FeedConfig) -> Self {
        Self::build(config, false)
    }

    /// Every positive user id resolves. Used when no identity service is attached.
    pub fn with_open_registration(config: &FeedConfig) -> Self {
        Self::build(config, true)
    }

    fn build(config: &FeedConfig, open_registration: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                open_registration,
                comment_max_length: config.comment_max_length,
                sequences: Mutex::new(Sequences::default()),
                users: RwLock::new(BTreeMap::new()),
                media: RwLock::new(BTreeMap::new()),
            }),
        }
    }

    async fn entry(&self, media_id: i64) -> Result<Arc<MediaEntry>, AppError> {
        self.inner
            .media
            .read()
            .await
            .get(&media_id)
            .cloned()
            .ok_or_else(|| AppError::media_not_found(media_id))
    }

    async fn all_entries(&self) -> Vec<Arc<MediaEntry>> {
        self.inner.media.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn user_exists(&self, user_id: i64) -> Result<bool, AppError> {
        if self.inner.open_registration && user_id > 0 {
            return Ok(true);
        }
        Ok(self.inner.users.read().await.contains_key(&user_id))
    }

    async fn create_user(&self, username: &str) -> Result<User, AppError> {
        let mut users = self.inner.users.write().await;
        if users.values().any(|u| u.username == username) {
            return Err(AppError::Conflict(format!(
                "Username '{}' is already taken",
                username
            )));
        }

        let (id, created_at) = {
            let mut seq = self.inner.sequences.lock().await;
            (Sequences::next(&mut seq.user_id), seq.stamp())
        };
        let user = User {
            id,
            username: username.to_string(),
            created_at,
        };
        users.insert(id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl MediaCatalog for InMemoryStore {
    async fn create_media(&self, new_media: NewMedia) -> Result<Media, AppError> {
        self.ensure_user(new_media.creator_id).await?;

        let (id, created_at) = {
            let mut seq = self.inner.sequences.lock().await;
            (Sequences::next(&mut seq.media_id), seq.stamp())
        };
        let media = Media {
            id,
            creator_id: new_media.creator_id,
            file_name: new_media.file_name,
            file_size: new_media.file_size,
            content_type: new_media.content_type,
            download_handle: new_media.download_handle,
            download_url: new_media.download_url,
            created_at,
            likes_count: 0,
            comments_count: 0,
        };

        let entry = MediaEntry {
            key: media.sort_key(),
            state: Mutex::new(MediaState {
                media: media.clone(),
                likes: HashMap::new(),
                comments: BTreeMap::new(),
            }),
        };
        self.inner.media.write().await.insert(id, Arc::new(entry));

        tracing::debug!(media_id = id, "Media created");
        Ok(media)
    }

    async fn get_media(&self, media_id: i64) -> Result<Media, AppError> {
        let entry = self.entry(media_id).await?;
        let state = entry.state.lock().await;
        Ok(state.media.clone())
    }

    async fn list_feed(
        &self,
        _viewer_id: i64,
        page: PageRequest,
    ) -> Result<Page<Media>, AppError> {
        let selected = {
            let media = self.inner.media.read().await;
            let anchor = match page.after {
                None => None,
                Some(after) => match media.get(&after) {
                    Some(entry) => Some(entry.key),
                    None => return Ok(Page::empty()),
                },
            };

            let mut selected: Vec<Arc<MediaEntry>> = media
                .values()
                .filter(|e| anchor.map_or(true, |a| is_after(&e.key, &a)))
                .cloned()
                .collect();
            selected.sort_by(|a, b| newest_first(&a.key, &b.key));
            selected.truncate(page.fetch_size() as usize);
            selected
        };

        let mut rows = Vec::with_capacity(selected.len());
        for entry in selected {
            rows.push(entry.state.lock().await.media.clone());
        }
        Ok(Page::from_lookahead(rows, page.limit))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait]
impl EngagementLedger for InMemoryStore {
    async fn like(&self, user_id: i64, media_id: i64) -> Result<LikeResult, AppError> {
        let entry = self.entry(media_id).await?;
        let mut state = entry.state.lock().await;

        if !state.likes.contains_key(&user_id) {
            let stamp = {
                let mut seq = self.inner.sequences.lock().await;
                let at = seq.stamp();
                (at, Sequences::next(&mut seq.like_seq))
            };
            state.likes.insert(user_id, stamp);
            state.media.likes_count += 1;
        }

        Ok(LikeResult {
            media_id,
            likes_count: state.media.likes_count,
        })
    }

    async fn dislike(&self, user_id: i64, media_id: i64) -> Result<LikeResult, AppError> {
        let entry = self.entry(media_id).await?;
        let mut state = entry.state.lock().await;

        if state.likes.remove(&user_id).is_some() {
            state.media.likes_count =
                clamp_decrement(state.media.likes_count, media_id, "likes_count");
        }

        Ok(LikeResult {
            media_id,
            likes_count: state.media.likes_count,
        })
    }

    async fn comment(
        &self,
        user_id: i64,
        media_id: i64,
        text: &str,
    ) -> Result<Comment, AppError> {
        let text = normalize_comment_text(text, self.inner.comment_max_length)?;
        let entry = self.entry(media_id).await?;
        let mut state = entry.state.lock().await;

        let (id, created_at) = {
            let mut seq = self.inner.sequences.lock().await;
            (Sequences::next(&mut seq.comment_id), seq.stamp())
        };
        let comment = Comment {
            id,
            media_id,
            author_id: user_id,
            text,
            created_at,
        };
        state.comments.insert(id, comment.clone());
        state.media.comments_count += 1;

        Ok(comment)
    }

    async fn uncomment(
        &self,
        user_id: i64,
        media_id: i64,
        comment_id: i64,
    ) -> Result<(), AppError> {
        let entry = self.entry(media_id).await?;
        let mut state = entry.state.lock().await;

        let comment = state
            .comments
            .get(&comment_id)
            .ok_or_else(|| AppError::comment_not_found(comment_id, media_id))?;
        if !can_delete_comment(user_id, comment) {
            return Err(AppError::Forbidden(format!(
                "User {} may not delete comment {}",
                user_id, comment_id
            )));
        }

        state.comments.remove(&comment_id);
        state.media.comments_count =
            clamp_decrement(state.media.comments_count, media_id, "comments_count");
        Ok(())
    }

    async fn list_comments(
        &self,
        media_id: i64,
        page: PageRequest,
    ) -> Result<Page<Comment>, AppError> {
        let entry = self.entry(media_id).await?;
        let state = entry.state.lock().await;

        let anchor = match page.after {
            None => None,
            Some(after) => match state.comments.get(&after) {
                Some(comment) => Some(comment.sort_key()),
                None => return Ok(Page::empty()),
            },
        };

        let mut rows: Vec<Comment> = state
            .comments
            .values()
            .filter(|c| anchor.map_or(true, |a| is_after(&c.sort_key(), &a)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| newest_first(&a.sort_key(), &b.sort_key()));
        rows.truncate(page.fetch_size() as usize);

        Ok(Page::from_lookahead(rows, page.limit))
    }

    async fn list_media_liked_by(&self, user_id: i64) -> Result<Vec<Media>, AppError> {
        let mut liked = Vec::new();
        for entry in self.all_entries().await {
            let state = entry.state.lock().await;
            if let Some(stamp) = state.likes.get(&user_id) {
                liked.push((*stamp, state.media.clone()));
            }
        }
        liked.sort_by(|a, b| newest_first(&a.0, &b.0));
        Ok(liked.into_iter().map(|(_, media)| media).collect())
    }

    async fn list_media_commented_by(&self, user_id: i64) -> Result<Vec<Media>, AppError> {
        let mut commented = Vec::new();
        for entry in self.all_entries().await {
            let state = entry.state.lock().await;
            let latest = state
                .comments
                .values()
                .filter(|c| c.author_id == user_id)
                .map(Paginated::sort_key)
                .max();
            if let Some(latest) = latest {
                commented.push((latest, state.media.clone()));
            }
        }
        commented.sort_by(|a, b| newest_first(&a.0, &b.0));
        Ok(commented.into_iter().map(|(_, media)| media).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn store() -> InMemoryStore {
        InMemoryStore::new(&FeedConfig::default())
    }

    fn new_media(creator_id: i64, name: &str) -> NewMedia {
        NewMedia {
            creator_id,
            file_name: name.to_string(),
            file_size: 3,
            content_type: "image/png".to_string(),
            download_handle: format!("media/{}/{}", creator_id, name),
            download_url: format!("http://localhost/files/media/{}/{}", creator_id, name),
        }
    }

    async fn seed(store: &InMemoryStore, users: usize, media: usize) -> (Vec<i64>, Vec<i64>) {
        let mut user_ids = Vec::new();
        for i in 0..users {
            user_ids.push(store.create_user(&format!("user{}", i)).await.unwrap().id);
        }
        let mut media_ids = Vec::new();
        for i in 0..media {
            let created = store
                .create_media(new_media(user_ids[0], &format!("m{}.png", i)))
                .await
                .unwrap();
            media_ids.push(created.id);
        }
        (user_ids, media_ids)
    }

    fn page(after: Option<i64>, limit: u32) -> PageRequest {
        PageRequest { after, limit }
    }

    #[tokio::test]
    async fn create_media_starts_with_zero_counters() {
        let store = store();
        let (users, _) = seed(&store, 1, 0).await;
        let media = store.create_media(new_media(users[0], "a.png")).await.unwrap();
        assert_eq!(media.likes_count, 0);
        assert_eq!(media.comments_count, 0);
        assert_eq!(store.get_media(media.id).await.unwrap(), media);
    }

    #[tokio::test]
    async fn create_media_for_unknown_creator_is_not_found() {
        let store = store();
        let result = store.create_media(new_media(42, "a.png")).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn open_registration_resolves_positive_ids() {
        let store = InMemoryStore::with_open_registration(&FeedConfig::default());
        assert!(store.user_exists(17).await.unwrap());
        assert!(!store.user_exists(0).await.unwrap());
        assert!(store.create_media(new_media(17, "a.png")).await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = store();
        store.create_user("ada").await.unwrap();
        assert!(matches!(
            store.create_user("ada").await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn repeated_like_is_idempotent() {
        let store = store();
        let (users, media) = seed(&store, 1, 1).await;

        let first = store.like(users[0], media[0]).await.unwrap();
        let second = store.like(users[0], media[0]).await.unwrap();
        assert_eq!(first.likes_count, 1);
        assert_eq!(second.likes_count, 1);
        assert_eq!(store.get_media(media[0]).await.unwrap().likes_count, 1);
    }

    #[tokio::test]
    async fn dislike_without_like_is_noop() {
        let store = store();
        let (users, media) = seed(&store, 2, 1).await;

        store.like(users[1], media[0]).await.unwrap();
        let result = store.dislike(users[0], media[0]).await.unwrap();
        assert_eq!(result.likes_count, 1);

        let result = store.dislike(users[1], media[0]).await.unwrap();
        assert_eq!(result.likes_count, 0);
        let result = store.dislike(users[1], media[0]).await.unwrap();
        assert_eq!(result.likes_count, 0);
    }

    #[tokio::test]
    async fn like_on_missing_media_is_not_found() {
        let store = store();
        let (users, _) = seed(&store, 1, 0).await;
        assert!(matches!(
            store.like(users[0], 99).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            store.dislike(users[0], 99).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_likes_from_distinct_users_are_all_counted() {
        let store = InMemoryStore::with_open_registration(&FeedConfig::default());
        let media_id = store.create_media(new_media(1, "hot.png")).await.unwrap().id;

        let handles: Vec<_> = (1..=64)
            .map(|user_id| {
                let store = store.clone();
                tokio::spawn(async move { store.like(user_id, media_id).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.get_media(media_id).await.unwrap().likes_count, 64);
        assert_eq!(store.list_media_liked_by(10).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_repeat_likes_count_once() {
        let store = InMemoryStore::with_open_registration(&FeedConfig::default());
        let media_id = store.create_media(new_media(1, "hot.png")).await.unwrap().id;

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.like(7, media_id).await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().likes_count, 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn interleaved_like_and_dislike_keep_counter_consistent() {
        let store = InMemoryStore::with_open_registration(&FeedConfig::default());
        let media_id = store.create_media(new_media(1, "hot.png")).await.unwrap().id;

        let handles: Vec<_> = (1..=40)
            .map(|user_id| {
                let store = store.clone();
                tokio::spawn(async move {
                    store.like(user_id, media_id).await?;
                    if user_id % 2 == 0 {
                        store.dislike(user_id, media_id).await?;
                    }
                    Ok::<_, AppError>(())
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.get_media(media_id).await.unwrap().likes_count, 20);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_uploads_keep_created_at_ordered_by_id() {
        let store = InMemoryStore::with_open_registration(&FeedConfig::default());

        let handles: Vec<_> = (0..30)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store.create_media(new_media(i % 3 + 1, &format!("{}.png", i))).await
                })
            })
            .collect();
        let mut created = Vec::new();
        for handle in handles {
            created.push(handle.await.unwrap().unwrap());
        }
        created.sort_by_key(|media| media.id);

        for pair in created.windows(2) {
            assert!(pair[0].created_at <= pair[1].created_at);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn interleaved_comment_and_uncomment_keep_counter_consistent() {
        let store = InMemoryStore::with_open_registration(&FeedConfig::default());
        let media_id = store.create_media(new_media(1, "hot.png")).await.unwrap().id;

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let user_id = i % 7 + 1;
                    let comment = store.comment(user_id, media_id, "first!").await?;
                    if i % 3 == 0 {
                        store.uncomment(user_id, media_id, comment.id).await?;
                    }
                    Ok::<_, AppError>(())
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let live = store.list_comments(media_id, page(None, 100)).await.unwrap();
        let media = store.get_media(media_id).await.unwrap();
        assert_eq!(live.items.len(), 33);
        assert_eq!(media.comments_count, live.items.len() as i64);
    }

    #[tokio::test]
    async fn comments_move_the_counter() {
        let store = store();
        let (users, media) = seed(&store, 1, 1).await;

        let first = store.comment(users[0], media[0], "  first  ").await.unwrap();
        assert_eq!(first.text, "first");
        store.comment(users[0], media[0], "second").await.unwrap();
        assert_eq!(store.get_media(media[0]).await.unwrap().comments_count, 2);

        store.uncomment(users[0], media[0], first.id).await.unwrap();
        assert_eq!(store.get_media(media[0]).await.unwrap().comments_count, 1);
    }

    #[tokio::test]
    async fn blank_comment_is_rejected_without_side_effects() {
        let store = store();
        let (users, media) = seed(&store, 1, 1).await;

        let result = store.comment(users[0], media[0], "   ").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(store.get_media(media[0]).await.unwrap().comments_count, 0);
    }

    #[tokio::test]
    async fn only_the_author_may_uncomment() {
        let store = store();
        let (users, media) = seed(&store, 2, 1).await;
        let comment = store.comment(users[0], media[0], "mine").await.unwrap();

        let result = store.uncomment(users[1], media[0], comment.id).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(store.get_media(media[0]).await.unwrap().comments_count, 1);
    }

    #[tokio::test]
    async fn uncomment_on_other_media_is_not_found() {
        let store = store();
        let (users, media) = seed(&store, 1, 2).await;
        let comment = store.comment(users[0], media[0], "here").await.unwrap();

        let result = store.uncomment(users[0], media[1], comment.id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(store.get_media(media[0]).await.unwrap().comments_count, 1);
    }

    #[tokio::test]
    async fn feed_pages_cover_every_item_once() {
        let store = store();
        let (_, media) = seed(&store, 1, 5).await;

        let mut seen = Vec::new();
        let mut after = None;
        let mut pages = 0;
        loop {
            let result = store.list_feed(1, page(after, 2)).await.unwrap();
            pages += 1;
            seen.extend(result.items.iter().map(|m| m.id));
            match result.next_cursor {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }

        assert_eq!(pages, 3);
        let expected: Vec<i64> = media.iter().rev().copied().collect();
        assert_eq!(seen, expected);
        let unique: HashSet<_> = seen.iter().collect();
        assert_eq!(unique.len(), 5);
    }

    #[tokio::test]
    async fn exact_multiple_ends_without_cursor() {
        let store = store();
        seed(&store, 1, 4).await;

        let first = store.list_feed(1, page(None, 2)).await.unwrap();
        let second = store.list_feed(1, page(first.next_cursor, 2)).await.unwrap();
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.next_cursor, None);
    }

    #[tokio::test]
    async fn unknown_cursor_returns_empty_page() {
        let store = store();
        seed(&store, 1, 3).await;

        let result = store.list_feed(1, page(Some(999), 10)).await.unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.next_cursor, None);
    }

    #[tokio::test]
    async fn comments_paginate_newest_first() {
        let store = store();
        let (users, media) = seed(&store, 1, 1).await;
        let mut ids = Vec::new();
        for i in 0..3 {
            let text = format!("c{}", i);
            ids.push(store.comment(users[0], media[0], &text).await.unwrap().id);
        }

        let first = store.list_comments(media[0], page(None, 2)).await.unwrap();
        assert_eq!(
            first.items.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![ids[2], ids[1]]
        );
        let second = store
            .list_comments(media[0], page(first.next_cursor, 2))
            .await
            .unwrap();
        assert_eq!(second.items.iter().map(|c| c.id).collect::<Vec<_>>(), vec![ids[0]]);
        assert_eq!(second.next_cursor, None);
    }

    #[tokio::test]
    async fn deleted_comment_cursor_returns_empty_page() {
        let store = store();
        let (users, media) = seed(&store, 1, 1).await;
        let comment = store.comment(users[0], media[0], "gone").await.unwrap();
        store.uncomment(users[0], media[0], comment.id).await.unwrap();

        let result = store
            .list_comments(media[0], page(Some(comment.id), 5))
            .await
            .unwrap();
        assert!(result.items.is_empty());
    }

    #[tokio::test]
    async fn liked_by_lists_most_recent_like_first() {
        let store = store();
        let (users, media) = seed(&store, 1, 3).await;

        store.like(users[0], media[1]).await.unwrap();
        store.like(users[0], media[0]).await.unwrap();
        store.like(users[0], media[2]).await.unwrap();
        store.dislike(users[0], media[2]).await.unwrap();

        let liked: Vec<i64> = store
            .list_media_liked_by(users[0])
            .await
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(liked, vec![media[0], media[1]]);
    }

    #[tokio::test]
    async fn commented_by_orders_by_latest_comment() {
        let store = store();
        let (users, media) = seed(&store, 2, 3).await;

        store.comment(users[0], media[0], "a").await.unwrap();
        store.comment(users[0], media[1], "b").await.unwrap();
        store.comment(users[0], media[0], "c").await.unwrap();
        store.comment(users[1], media[2], "other").await.unwrap();

        let commented: Vec<i64> = store
            .list_media_commented_by(users[0])
            .await
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(commented, vec![media[0], media[1]]);
    }
}
