//! Source classification

/// URI scheme prefixes treated as network streams
const REMOTE_PREFIXES: [&str; 2] = ["http", "rtmp"];

/// Engine stream options set before loading a remote source
pub const STREAM_RECONNECT_OPTIONS: &str = "reconnect=1,reconnect_streamed=1,reconnect_delay_max=5";

/// Kind of source handed to `load_source`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// `http`, `https`, `rtmp`, `rtmps` streams
    Remote,
    /// Anything else, passed to the engine as a path
    Local,
}

impl SourceKind {
    /// Classify by URI-scheme prefix
    ///
    /// A string must be longer than the four-character prefix to count as
    /// remote, so a file literally named `http` stays local.
    pub fn classify(target: &str) -> Self {
        let remote = target.len() > 4
            && REMOTE_PREFIXES.iter().any(|prefix| {
                target
                    .get(..prefix.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
            });

        if remote {
            SourceKind::Remote
        } else {
            SourceKind::Local
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SourceKind::Remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_sources() {
        assert_eq!(SourceKind::classify("http://host/stream"), SourceKind::Remote);
        assert_eq!(SourceKind::classify("https://host/a.m3u8"), SourceKind::Remote);
        assert_eq!(SourceKind::classify("rtmp://live/app"), SourceKind::Remote);
        assert_eq!(SourceKind::classify("HTTP://HOST/X"), SourceKind::Remote);
    }

    #[test]
    fn test_local_sources() {
        assert_eq!(SourceKind::classify("/local/file.mp4"), SourceKind::Local);
        assert_eq!(SourceKind::classify("C:\\Videos\\ep01.mkv"), SourceKind::Local);
        assert_eq!(SourceKind::classify("http"), SourceKind::Local);
        assert_eq!(SourceKind::classify(""), SourceKind::Local);
        assert_eq!(SourceKind::classify("ftp://host/file"), SourceKind::Local);
    }

    #[test]
    fn test_multibyte_prefix_does_not_panic() {
        assert_eq!(SourceKind::classify("ñññ.mkv"), SourceKind::Local);
    }
}
