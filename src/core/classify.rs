//! Build output line classification
//!
//! FreeBSD's build system prefixes milestones with `>>> ` and announces each
//! subdirectory it enters with `===> `. Everything else is noise on the
//! terminal and only goes to the log.

/// Prefix of a major build milestone, e.g. `>>> stage 2.1: cleaning up the object tree`
pub const MAJOR_STATUS_MARKER: &[u8] = b">>> ";

/// Prefix of a subdirectory progress line, e.g. `===> lib/libc (all)`
pub const SUBDIR_PROGRESS_MARKER: &[u8] = b"===> ";

/// How a line of build output is rendered on the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Kept visible on its own line
    MajorStatus,
    /// Replaces the previous progress line
    SubdirProgress,
    /// Log only
    Plain,
}

/// Classify one line of build output
pub fn classify_line(line: &[u8]) -> LineKind {
    if line.starts_with(MAJOR_STATUS_MARKER) {
        LineKind::MajorStatus
    } else if line.starts_with(SUBDIR_PROGRESS_MARKER) {
        LineKind::SubdirProgress
    } else {
        LineKind::Plain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_major_status() {
        assert_eq!(
            classify_line(b">>> stage 2.1: cleaning up the object tree\n"),
            LineKind::MajorStatus
        );
    }

    #[test]
    fn test_subdir_progress() {
        assert_eq!(classify_line(b"===> lib/libc (all)\n"), LineKind::SubdirProgress);
    }

    #[test]
    fn test_plain_lines() {
        assert_eq!(classify_line(b"cc -O2 -pipe -c foo.c\n"), LineKind::Plain);
        assert_eq!(classify_line(b""), LineKind::Plain);
        // markers only count at the start and with their trailing space
        assert_eq!(classify_line(b" >>> indented\n"), LineKind::Plain);
        assert_eq!(classify_line(b">>>no-space\n"), LineKind::Plain);
        assert_eq!(classify_line(b"===>lib\n"), LineKind::Plain);
    }

    #[test]
    fn test_non_utf8_is_accepted() {
        assert_eq!(classify_line(b">>> \xff\xfe\n"), LineKind::MajorStatus);
        assert_eq!(classify_line(b"\xff\xfe\n"), LineKind::Plain);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_major_prefix_wins(rest in proptest::collection::vec(any::<u8>(), 0..80)) {
            let mut line = MAJOR_STATUS_MARKER.to_vec();
            line.extend(rest);
            prop_assert_eq!(classify_line(&line), LineKind::MajorStatus);
        }

        #[test]
        fn prop_subdir_prefix(rest in proptest::collection::vec(any::<u8>(), 0..80)) {
            let mut line = SUBDIR_PROGRESS_MARKER.to_vec();
            line.extend(rest);
            prop_assert_eq!(classify_line(&line), LineKind::SubdirProgress);
        }

        #[test]
        fn prop_lines_without_marker_are_plain(line in "[^>=].*") {
            prop_assert_eq!(classify_line(line.as_bytes()), LineKind::Plain);
        }
    }
}
