use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;

/// Widest span a single range token may cover
pub const MAX_RANGE_SPAN: u32 = 2000;

/// Most pages one input may select in total
pub const MAX_PAGES: usize = 5000;

lazy_static! {
    static ref RANGE_DASH: Regex = Regex::new(r"\s*([-~〜–—])\s*").unwrap();
    static ref SEPARATORS: Regex = Regex::new(r"[,、，;\s]+").unwrap();
    static ref SINGLE: Regex = Regex::new(r"^(\d+)$").unwrap();
    static ref RANGE: Regex = Regex::new(r"^(\d+)\s*[-~〜–—]\s*(\d+)$").unwrap();
}

/// Parse the page box of the score search
///
/// Accepts single pages and inclusive ranges separated by commas or spaces,
/// e.g. `"3,14,15-92"`. Full-width input (`３、１４`) is folded first. Reversed
/// ranges are swapped, ranges wider than [`MAX_RANGE_SPAN`] and unparseable
/// tokens are ignored. Input selecting more than [`MAX_PAGES`] pages yields
/// an empty set.
///
/// # Examples
/// ```
/// use libretto::pages::parse_page_input;
///
/// let pages = parse_page_input("3, 14, 15-17");
/// assert_eq!(pages.into_iter().collect::<Vec<_>>(), vec![3, 14, 15, 16, 17]);
/// ```
pub fn parse_page_input(input: &str) -> BTreeSet<u32> {
    let folded: String = input.nfkc().collect();
    let mut pages = BTreeSet::new();

    // Spaces around a range dash belong to the range, not the separator
    let tightened = RANGE_DASH.replace_all(&folded, "$1");

    for token in SEPARATORS.split(&tightened) {
        if token.is_empty() {
            continue;
        }
        if let Some(caps) = SINGLE.captures(token) {
            if let Ok(page) = caps[1].parse::<u32>() {
                pages.insert(page);
            }
        } else if let Some(caps) = RANGE.captures(token) {
            let (Ok(a), Ok(b)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
                continue;
            };
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            if end - start > MAX_RANGE_SPAN {
                log::warn!("Ignoring page range {}-{}: wider than {}", start, end, MAX_RANGE_SPAN);
                continue;
            }
            if pages.len() + (end - start) as usize + 1 > MAX_PAGES {
                log::warn!("Ignoring page input: more than {} pages", MAX_PAGES);
                return BTreeSet::new();
            }
            pages.extend(start..=end);
        }
    }

    pages
}
