//! Random page selection under the result ceiling.
//!
//! The search service paginates through at most a fixed number of results,
//! so only pages `1..=ceiling / per_page` are reachable. When more than one
//! page exists the last one is excluded because it may be short.

use rand::Rng;

use super::outcome::CollectionFailure;

/// Uniform sampler over `1..=upper`.
#[cfg_attr(test, mockall::automock)]
pub trait PageSampler: Send + Sync {
    /// Return a page number in `1..=upper`. `upper` is at least 1.
    fn sample(&self, upper: u32) -> u32;
}

/// Default sampler backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPageSampler;

impl PageSampler for RandomPageSampler {
    fn sample(&self, upper: u32) -> u32 {
        rand::thread_rng().gen_range(1..=upper.max(1))
    }
}

/// Highest page eligible for sampling.
///
/// # Errors
///
/// Returns [`CollectionFailure::Protocol`] when `total_pages` is below 1.
///
/// # Examples
/// ```
/// use pin_gallery::domain::eligible_page_bound;
///
/// assert_eq!(eligible_page_bound(1, 190), Ok(1));
/// assert_eq!(eligible_page_bound(2, 190), Ok(1));
/// assert_eq!(eligible_page_bound(10, 5), Ok(5));
/// ```
pub fn eligible_page_bound(
    total_pages: i64,
    max_allowed_page: u32,
) -> Result<u32, CollectionFailure> {
    if total_pages < 1 {
        return Err(CollectionFailure::Protocol {
            message: format!("search reported {total_pages} pages"),
        });
    }
    let eligible = if total_pages > 1 {
        total_pages - 1
    } else {
        total_pages
    };
    let eligible = u32::try_from(eligible).unwrap_or(u32::MAX);
    Ok(eligible.min(max_allowed_page.max(1)))
}

/// Pick the page to fetch.
///
/// # Errors
///
/// Propagates the error from [`eligible_page_bound`].
pub fn select_page(
    total_pages: i64,
    max_allowed_page: u32,
    sampler: &dyn PageSampler,
) -> Result<u32, CollectionFailure> {
    let upper = eligible_page_bound(total_pages, max_allowed_page)?;
    Ok(sampler.sample(upper).clamp(1, upper))
}

#[cfg(test)]
mod tests {
    //! Bounds and distribution of the page selector.

    use std::collections::BTreeSet;

    use super::*;
    use rstest::rstest;

    const DRAWS: usize = 2_000;

    fn draw_pages(total_pages: i64, max_allowed_page: u32) -> BTreeSet<u32> {
        (0..DRAWS)
            .map(|_| {
                select_page(total_pages, max_allowed_page, &RandomPageSampler)
                    .expect("selection should succeed")
            })
            .collect()
    }

    #[rstest]
    fn single_page_always_selects_page_one() {
        assert_eq!(draw_pages(1, 190), BTreeSet::from([1]));
    }

    #[rstest]
    fn two_pages_exclude_the_last() {
        assert_eq!(draw_pages(2, 190), BTreeSet::from([1]));
    }

    #[rstest]
    fn ceiling_bounds_the_range_and_every_page_is_reachable() {
        assert_eq!(draw_pages(10, 5), BTreeSet::from([1, 2, 3, 4, 5]));
    }

    #[rstest]
    fn last_page_is_excluded_below_the_ceiling() {
        let pages = draw_pages(4, 190);
        assert_eq!(pages, BTreeSet::from([1, 2, 3]));
    }

    #[rstest]
    #[case::zero(0)]
    #[case::negative(-3)]
    fn fewer_than_one_page_is_a_failure(#[case] total_pages: i64) {
        let result = select_page(total_pages, 190, &RandomPageSampler);
        assert!(matches!(result, Err(CollectionFailure::Protocol { .. })));
    }

    #[rstest]
    fn huge_page_counts_saturate_to_the_ceiling() {
        assert_eq!(eligible_page_bound(i64::MAX, 190), Ok(190));
    }

    #[rstest]
    fn sampler_receives_the_eligible_bound() {
        let mut sampler = MockPageSampler::new();
        sampler
            .expect_sample()
            .withf(|upper| *upper == 9)
            .times(1)
            .returning(|upper| upper);

        assert_eq!(select_page(10, 190, &sampler), Ok(9));
    }

    #[rstest]
    fn out_of_range_samples_are_clamped() {
        let mut sampler = MockPageSampler::new();
        sampler.expect_sample().returning(|_| 0);

        assert_eq!(select_page(10, 190, &sampler), Ok(1));
    }
}
