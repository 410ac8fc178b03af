use serde::Deserialize;
use std::ops::Range;

const PAGINATOR_LOOK_AHEAD: i32 = 2;

/// Query string carrying the requested page number, e.g. `?page=3`.
/// Kept as a raw string so junk input can clamp instead of failing to
/// deserialize.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// One page of an ordered collection, plus the counts needed to render
/// page navigation.
///
/// [1] 2 3 ... 13
/// 1 2 [3] 4 5 ... 13
/// 1 2 3 4 [5] 6 7 ... 13
/// 1 ... 4 5 [6] 7 8 ... 13
/// 1 ... 7 8 [9] 10 11 12 13
/// 1 ... 9 10 [11] 12 13
/// 1 ... 11 12 [13]
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub this_page: i32,
    pub page_count: i32,
    pub base_url: String,
}

/// Parses a 1-based page number from a query parameter.
/// Absent, non-numeric, zero, and negative input all clamp to 1.
pub fn parse_page_param(param: Option<&str>) -> i32 {
    match param {
        Some(value) => match value.trim().parse::<i32>() {
            Ok(n) if n >= 1 => n,
            _ => 1,
        },
        None => 1,
    }
}

/// Slices an already-ordered collection into the requested page.
/// Out-of-range page numbers clamp to the nearest valid page.
pub fn paginate<T>(items: Vec<T>, per_page: usize, page_param: Option<&str>, base_url: &str) -> Page<T> {
    debug_assert!(per_page > 0);
    let total = items.len();
    let page_count = (((total + per_page - 1) / per_page).max(1)) as i32;
    let this_page = parse_page_param(page_param).min(page_count);
    let start = (this_page as usize - 1) * per_page;
    let items: Vec<T> = items.into_iter().skip(start).take(per_page).collect();

    Page {
        items,
        total,
        this_page,
        page_count,
        base_url: base_url.to_owned(),
    }
}

impl<T> Page<T> {
    pub fn has_pages(&self) -> bool {
        self.page_count > 1
    }

    /// The run of page links anchored at page 1.
    pub fn get_first_pages(&self) -> Range<i32> {
        if self.this_page - PAGINATOR_LOOK_AHEAD > 1 + PAGINATOR_LOOK_AHEAD {
            // the cursor window is detached from the head, show page 1 alone
            1..2
        } else if self.this_page + PAGINATOR_LOOK_AHEAD < self.page_count - PAGINATOR_LOOK_AHEAD {
            // the head run absorbs the cursor window
            1..(self.this_page + PAGINATOR_LOOK_AHEAD + 1)
        } else {
            // every page fits in one run
            1..(self.page_count + 1)
        }
    }

    /// The detached run around the cursor, when it touches neither end.
    pub fn get_inner_pages(&self) -> Option<Range<i32>> {
        if self.this_page - PAGINATOR_LOOK_AHEAD <= 1 + PAGINATOR_LOOK_AHEAD {
            None
        } else if self.this_page + PAGINATOR_LOOK_AHEAD >= self.page_count - PAGINATOR_LOOK_AHEAD {
            None
        } else {
            Some(
                (self.this_page - PAGINATOR_LOOK_AHEAD)
                    ..(self.this_page + PAGINATOR_LOOK_AHEAD + 1),
            )
        }
    }

    /// The run anchored at the last page, when it is not already covered.
    pub fn get_last_pages(&self) -> Option<Range<i32>> {
        if self.this_page + PAGINATOR_LOOK_AHEAD >= self.page_count - PAGINATOR_LOOK_AHEAD {
            if self.this_page - PAGINATOR_LOOK_AHEAD > 1 + PAGINATOR_LOOK_AHEAD {
                // tail run including the cursor window
                Some((self.this_page - PAGINATOR_LOOK_AHEAD)..(self.page_count + 1))
            } else {
                // already covered by the first run
                None
            }
        } else {
            Some(self.page_count..(self.page_count + 1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn absent_and_junk_page_params_clamp_to_one() {
        assert_eq!(parse_page_param(None), 1);
        assert_eq!(parse_page_param(Some("")), 1);
        assert_eq!(parse_page_param(Some("banana")), 1);
        assert_eq!(parse_page_param(Some("0")), 1);
        assert_eq!(parse_page_param(Some("-4")), 1);
        assert_eq!(parse_page_param(Some(" 7 ")), 7);
    }

    #[test]
    fn first_page_holds_per_page_items() {
        let page = paginate(numbers(25), 10, None, "/");
        assert_eq!(page.items, (0..10).collect::<Vec<_>>());
        assert_eq!(page.total, 25);
        assert_eq!(page.this_page, 1);
        assert_eq!(page.page_count, 3);
    }

    #[test]
    fn last_page_holds_the_remainder() {
        let page = paginate(numbers(25), 10, Some("3"), "/");
        assert_eq!(page.items, (20..25).collect::<Vec<_>>());
        assert_eq!(page.this_page, 3);
    }

    #[test]
    fn page_beyond_the_end_clamps_to_the_last_page() {
        let page = paginate(numbers(25), 10, Some("99"), "/");
        assert_eq!(page.this_page, 3);
        assert_eq!(page.items, (20..25).collect::<Vec<_>>());
        assert_eq!(page.total, 25);
    }

    #[test]
    fn empty_collection_yields_one_empty_page() {
        let page = paginate(Vec::<usize>::new(), 10, Some("5"), "/");
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.this_page, 1);
        assert_eq!(page.page_count, 1);
        assert!(!page.has_pages());
    }

    #[test]
    fn exact_multiple_has_no_phantom_page() {
        let page = paginate(numbers(20), 10, Some("3"), "/");
        assert_eq!(page.page_count, 2);
        assert_eq!(page.this_page, 2);
        assert_eq!(page.items, (10..20).collect::<Vec<_>>());
    }

    fn nav(this_page: i32, page_count: i32) -> Page<()> {
        Page {
            items: Vec::new(),
            total: 0,
            this_page,
            page_count,
            base_url: "/".to_owned(),
        }
    }

    #[test]
    fn nav_runs_near_the_head() {
        let page = nav(1, 13);
        assert_eq!(page.get_first_pages(), 1..4);
        assert_eq!(page.get_inner_pages(), None);
        assert_eq!(page.get_last_pages(), Some(13..14));

        let page = nav(5, 13);
        assert_eq!(page.get_first_pages(), 1..8);
        assert_eq!(page.get_inner_pages(), None);
        assert_eq!(page.get_last_pages(), Some(13..14));
    }

    #[test]
    fn nav_runs_in_the_middle() {
        let page = nav(6, 13);
        assert_eq!(page.get_first_pages(), 1..2);
        assert_eq!(page.get_inner_pages(), Some(4..9));
        assert_eq!(page.get_last_pages(), Some(13..14));
    }

    #[test]
    fn nav_runs_near_the_tail() {
        let page = nav(9, 13);
        assert_eq!(page.get_first_pages(), 1..2);
        assert_eq!(page.get_inner_pages(), None);
        assert_eq!(page.get_last_pages(), Some(7..14));

        let page = nav(13, 13);
        assert_eq!(page.get_first_pages(), 1..2);
        assert_eq!(page.get_inner_pages(), None);
        assert_eq!(page.get_last_pages(), Some(11..14));
    }
}
