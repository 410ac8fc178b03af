use once_cell::sync::OnceCell;
use std::time::Duration;

static POSTS_PER_PAGE: OnceCell<usize> = OnceCell::new();
static FEED_CACHE_TIME: OnceCell<Duration> = OnceCell::new();

const DEFAULT_POSTS_PER_PAGE: usize = 10;
const DEFAULT_FEED_CACHE_SECONDS: u64 = 20;
const DEFAULT_FEED_CACHE_TIME: Duration = Duration::from_secs(DEFAULT_FEED_CACHE_SECONDS);

#[inline(always)]
pub fn get_posts_per_page() -> usize {
    *POSTS_PER_PAGE.get().unwrap_or(&DEFAULT_POSTS_PER_PAGE)
}

#[inline(always)]
pub fn get_feed_cache_time() -> Duration {
    *FEED_CACHE_TIME.get().unwrap_or(&DEFAULT_FEED_CACHE_TIME)
}

pub fn init() {
    // Init POSTS_PER_PAGE
    let per_page = match std::env::var("POSTS_PER_PAGE") {
        Ok(value) => value
            .parse::<usize>()
            .expect("POSTS_PER_PAGE cannot be parsed as an integer"),
        Err(_) => DEFAULT_POSTS_PER_PAGE,
    };
    if per_page == 0 {
        panic!("POSTS_PER_PAGE must be at least 1!");
    }
    POSTS_PER_PAGE.set(per_page).ok();

    // Init FEED_CACHE_TIME
    let secs = match std::env::var("FEED_CACHE_SECONDS") {
        Ok(value) => value
            .parse::<u64>()
            .expect("FEED_CACHE_SECONDS cannot be parsed as an integer"),
        Err(_) => DEFAULT_FEED_CACHE_SECONDS,
    };
    FEED_CACHE_TIME.set(Duration::from_secs(secs)).ok();
}
