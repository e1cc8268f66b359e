//! The pending-track queue.

use std::collections::VecDeque;
use std::time::Duration;

use delegate::delegate;
use rand::seq::SliceRandom;
use rand::thread_rng;
use tokio::sync::Mutex;
use tokio::sync::Notify;

use super::track::Track;

/// FIFO queue of tracks waiting to play.
///
/// Producers are command handlers, the only consumer is the session's
/// playback loop. [TrackQueue::next] parks that consumer until a track
/// arrives or the wait runs out.
#[derive(Default)]
pub struct TrackQueue {
    inner: Mutex<VecDeque<Track>>,
    /// Wakes the consumer after a push.
    available: Notify,
}

impl TrackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    delegate! {
        to self.inner.lock().await {
            /// Number of pending tracks.
            #[await(false)]
            pub async fn len(&self) -> usize;
            /// Whether the queue has no pending tracks.
            #[await(false)]
            pub async fn is_empty(&self) -> bool;
            /// Drop every pending track.
            #[await(false)]
            pub async fn clear(&self);
        }
    }

    /// Append a track to the back of the queue.
    pub async fn push(&self, track: Track) {
        self.inner.lock().await.push_back(track);
        self.available.notify_one();
    }

    /// Take the front track, waiting up to `wait` for one to arrive.
    ///
    /// `None` means the queue stayed empty for the whole wait.
    pub async fn next(&self, wait: Duration) -> Option<Track> {
        let deadline = tokio::time::timeout(wait, async {
            loop {
                if let Some(track) = self.inner.lock().await.pop_front() {
                    return track;
                }
                // A push between the check and this await leaves a
                // stored permit, so the wakeup can't be lost.
                self.available.notified().await;
            }
        });

        deadline.await.ok()
    }

    /// Remove the track at `index` (0-based), like [VecDeque::remove].
    pub async fn remove(&self, index: usize) -> Option<Track> {
        self.inner.lock().await.remove(index)
    }

    /// Shuffle the pending tracks in place.
    pub async fn shuffle(&self) {
        let mut queue = self.inner.lock().await;
        queue.make_contiguous().shuffle(&mut thread_rng());
    }

    /// Copy out one page of the queue for display.
    ///
    /// `page` is 1-based and gets clamped into range; an empty queue
    /// still reports one (empty) page.
    pub async fn page(&self, page: usize, per_page: usize) -> QueuePage {
        let queue = self.inner.lock().await;

        let total = queue.len();
        let pages = total.div_ceil(per_page).max(1);
        let page = page.clamp(1, pages);
        let start = (page - 1) * per_page;
        let tracks = queue.iter().skip(start).take(per_page).cloned().collect();

        QueuePage {
            tracks,
            page,
            pages,
            total,
            start,
        }
    }
}

/// One page of the queue listing.
#[derive(Debug)]
pub struct QueuePage {
    /// Tracks on this page, in play order.
    pub tracks: Vec<Track>,
    /// 1-based page number, after clamping.
    pub page: usize,
    /// Total page count, at least 1.
    pub pages: usize,
    /// Total number of pending tracks.
    pub total: usize,
    /// 0-based queue index of the first entry on this page.
    pub start: usize,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::super::testutil::make_track;
    use super::*;

    async fn titles(queue: &TrackQueue) -> Vec<String> {
        let page = queue.page(1, usize::MAX).await;
        page.tracks.into_iter().map(|t| t.title).collect()
    }

    #[tokio::test]
    async fn pops_in_push_order() {
        let queue = TrackQueue::new();
        for title in ["a", "b", "c"] {
            queue.push(make_track(title)).await;
        }

        let mut popped = Vec::new();
        while let Some(track) = queue.next(Duration::from_millis(10)).await {
            popped.push(track.title);
        }

        assert_eq!(popped, ["a", "b", "c"]);
        assert!(queue.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn next_times_out_on_an_empty_queue() {
        let queue = TrackQueue::new();
        assert!(queue.next(Duration::from_secs(180)).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn push_wakes_a_waiting_consumer() {
        let queue = Arc::new(TrackQueue::new());

        let waiter = tokio::spawn({
            let queue = queue.clone();
            async move { queue.next(Duration::from_secs(60)).await }
        });

        tokio::task::yield_now().await;
        queue.push(make_track("a")).await;

        let got = waiter.await.unwrap();
        assert_eq!(got.unwrap().title, "a");
    }

    #[tokio::test]
    async fn remove_out_of_range_leaves_the_queue_alone() {
        let queue = TrackQueue::new();
        for title in ["a", "b", "c"] {
            queue.push(make_track(title)).await;
        }

        assert!(queue.remove(3).await.is_none());
        assert!(queue.remove(99).await.is_none());
        assert_eq!(titles(&queue).await, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn remove_keeps_the_remaining_order() {
        let queue = TrackQueue::new();
        for title in ["a", "b", "c"] {
            queue.push(make_track(title)).await;
        }

        let removed = queue.remove(1).await.unwrap();
        assert_eq!(removed.title, "b");
        assert_eq!(titles(&queue).await, ["a", "c"]);
    }

    #[tokio::test]
    async fn shuffle_keeps_every_track() {
        let queue = TrackQueue::new();
        let mut expected: Vec<String> = Vec::new();
        for n in 0..20 {
            let title = format!("track {n}");
            queue.push(make_track(&title)).await;
            expected.push(title);
        }

        queue.shuffle().await;

        let mut after = titles(&queue).await;
        after.sort();
        expected.sort();
        assert_eq!(after, expected);
    }

    #[tokio::test]
    async fn page_math_covers_partial_last_pages() {
        let queue = TrackQueue::new();
        for n in 0..25 {
            queue.push(make_track(&format!("track {n}"))).await;
        }

        let first = queue.page(1, 10).await;
        assert_eq!((first.page, first.pages, first.total), (1, 3, 25));
        assert_eq!(first.start, 0);
        assert_eq!(first.tracks.len(), 10);

        let last = queue.page(3, 10).await;
        assert_eq!(last.tracks.len(), 5);
        assert_eq!(last.start, 20);

        // Out-of-range pages clamp instead of erroring.
        let clamped = queue.page(99, 10).await;
        assert_eq!(clamped.page, 3);
    }

    #[tokio::test]
    async fn empty_queue_reports_one_empty_page() {
        let queue = TrackQueue::new();
        let page = queue.page(1, 10).await;

        assert_eq!((page.page, page.pages, page.total), (1, 1, 0));
        assert!(page.tracks.is_empty());
    }

    #[tokio::test]
    async fn concurrent_pushes_lose_nothing() {
        let queue = Arc::new(TrackQueue::new());

        let mut tasks = Vec::new();
        for worker in 0..4 {
            let queue = queue.clone();
            tasks.push(tokio::spawn(async move {
                for n in 0..25 {
                    queue.push(make_track(&format!("w{worker}-{n}"))).await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(queue.len().await, 100);
    }
}
