//! Pagination generator
//!
//! Turns a URL template with a single `%d` placeholder into the eager,
//! ascending sequence of page URLs submitted at run start.

use crate::config::PaginationSpec;

/// Placeholder substituted with the page number
pub const PLACEHOLDER: &str = "%d";

/// Generates one URL per page number in `[start, end]`, in ascending order
///
/// Produces exactly `end - start + 1` URLs (none when `start > end`, which
/// validation rejects before a run starts).
///
/// # Examples
///
/// ```
/// use web_trawl::config::PaginationSpec;
/// use web_trawl::crawler::generate_pages;
///
/// let spec = PaginationSpec { template: "https://x/p=%d".to_string(), start: 1, end: 3 };
/// assert_eq!(generate_pages(&spec), vec!["https://x/p=1", "https://x/p=2", "https://x/p=3"]);
/// ```
pub fn generate_pages(spec: &PaginationSpec) -> Vec<String> {
    (spec.start..=spec.end)
        .map(|page| spec.template.replacen(PLACEHOLDER, &page.to_string(), 1))
        .collect()
}
