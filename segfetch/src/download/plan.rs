//! Range planning for segmented downloads.
//!
//! A [`DownloadPlan`] splits `[0, total_bytes)` into contiguous, inclusive
//! byte ranges of roughly equal size. The last range absorbs the remainder of
//! the integer division.
//!
//! When more segments are requested than there are bytes, the segment count
//! is clamped to `total_bytes` so that every range holds at least one byte.

use super::error::{DownloadError, DownloadResult};

/// An inclusive byte range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset (inclusive).
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
}

impl ByteRange {
    /// Create a new inclusive range.
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Number of bytes covered by the range.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Ranges are never empty; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Value for an HTTP `Range` header covering this range.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// One planned unit of work: a range of the resource to fetch.
///
/// Tasks are immutable once planned and owned by the fetcher processing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentTask {
    /// 0-based position in the plan.
    pub index: usize,
    /// Bytes this segment is responsible for.
    pub range: ByteRange,
    /// Resource URL.
    pub url: String,
}

/// The complete partition of a resource into segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPlan {
    total_bytes: u64,
    ranges: Vec<ByteRange>,
}

impl DownloadPlan {
    /// Plan `segment_count` ranges over `total_bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidSegmentCount`] if `segment_count` is 0.
    pub fn new(total_bytes: u64, segment_count: usize) -> DownloadResult<Self> {
        if segment_count == 0 {
            return Err(DownloadError::InvalidSegmentCount);
        }

        let count = (segment_count as u64).min(total_bytes);
        if count == 0 {
            return Ok(Self {
                total_bytes,
                ranges: Vec::new(),
            });
        }

        let part_size = total_bytes / count;
        let ranges = (0..count)
            .map(|i| {
                let start = i * part_size;
                let end = if i == count - 1 {
                    total_bytes - 1
                } else {
                    (i + 1) * part_size - 1
                };
                ByteRange::new(start, end)
            })
            .collect();

        Ok(Self {
            total_bytes,
            ranges,
        })
    }

    /// Total size of the resource.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Effective number of segments (after clamping).
    pub fn segment_count(&self) -> usize {
        self.ranges.len()
    }

    /// The planned ranges in offset order.
    pub fn ranges(&self) -> &[ByteRange] {
        &self.ranges
    }

    /// Turn the plan into per-segment tasks for `url`.
    pub fn tasks(&self, url: &str) -> Vec<SegmentTask> {
        self.ranges
            .iter()
            .enumerate()
            .map(|(index, range)| SegmentTask {
                index,
                range: *range,
                url: url.to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_even_split() {
        let plan = DownloadPlan::new(10_000, 4).unwrap();
        assert_eq!(
            plan.ranges(),
            &[
                ByteRange::new(0, 2499),
                ByteRange::new(2500, 4999),
                ByteRange::new(5000, 7499),
                ByteRange::new(7500, 9999),
            ]
        );
    }

    #[test]
    fn test_plan_last_segment_absorbs_remainder() {
        let plan = DownloadPlan::new(10, 3).unwrap();
        assert_eq!(
            plan.ranges(),
            &[
                ByteRange::new(0, 2),
                ByteRange::new(3, 5),
                ByteRange::new(6, 9),
            ]
        );
    }

    #[test]
    fn test_plan_single_segment_covers_everything() {
        let plan = DownloadPlan::new(1234, 1).unwrap();
        assert_eq!(plan.ranges(), &[ByteRange::new(0, 1233)]);
    }

    #[test]
    fn test_plan_clamps_when_more_segments_than_bytes() {
        let plan = DownloadPlan::new(3, 8).unwrap();
        assert_eq!(plan.segment_count(), 3);
        assert!(plan.ranges().iter().all(|r| r.len() == 1));
    }

    #[test]
    fn test_plan_empty_resource() {
        let plan = DownloadPlan::new(0, 4).unwrap();
        assert_eq!(plan.segment_count(), 0);
        assert!(plan.tasks("http://a/b").is_empty());
    }

    #[test]
    fn test_plan_rejects_zero_segments() {
        let err = DownloadPlan::new(100, 0).unwrap_err();
        assert!(matches!(err, DownloadError::InvalidSegmentCount));
    }

    #[test]
    fn test_range_header_value() {
        assert_eq!(ByteRange::new(2500, 4999).header_value(), "bytes=2500-4999");
        assert_eq!(ByteRange::new(2500, 4999).len(), 2500);
    }

    #[test]
    fn test_tasks_carry_index_and_url() {
        let plan = DownloadPlan::new(100, 2).unwrap();
        let tasks = plan.tasks("http://host/file.iso");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].index, 1);
        assert_eq!(tasks[1].range, ByteRange::new(50, 99));
        assert_eq!(tasks[1].url, "http://host/file.iso");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_ranges_partition_resource(
                total in 1u64..5_000_000,
                segments in 1usize..64
            ) {
                let plan = DownloadPlan::new(total, segments).unwrap();
                let ranges = plan.ranges();

                prop_assert_eq!(ranges.len() as u64, (segments as u64).min(total));
                prop_assert_eq!(ranges[0].start, 0);
                prop_assert_eq!(ranges[ranges.len() - 1].end, total - 1);

                for pair in ranges.windows(2) {
                    prop_assert_eq!(pair[0].end + 1, pair[1].start);
                }

                let covered: u64 = ranges.iter().map(ByteRange::len).sum();
                prop_assert_eq!(covered, total);
            }

            #[test]
            fn test_no_range_is_inverted(
                total in 1u64..100_000,
                segments in 1usize..512
            ) {
                let plan = DownloadPlan::new(total, segments).unwrap();
                for range in plan.ranges() {
                    prop_assert!(range.start <= range.end);
                }
            }
        }
    }
}
