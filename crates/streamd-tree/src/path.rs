use std::sync::Arc;

use percent_encoding::percent_decode_str;

use streamd_types::{ControlError, ControlResult};

use crate::node::Node;

/// Resolve an absolute, `/`-separated, URL-encoded path from `root`.
///
/// Each segment is percent-decoded and looked up case-sensitively in the
/// current node's child index. Empty segments (double or trailing slashes)
/// are skipped, so `/pipelines//p0/` resolves like `/pipelines/p0`. The
/// returned `Arc` is the caller's reference; dropping it releases the node.
pub fn resolve(root: Arc<dyn Node>, path: &str) -> ControlResult<Arc<dyn Node>> {
    let mut current = root;
    for segment in path.split('/') {
        if segment.is_empty() {
            continue;
        }
        let decoded = percent_decode_str(segment)
            .decode_utf8()
            .map_err(|_| ControlError::BadCommand(format!("malformed path segment: {segment:?}")))?;
        current = current
            .child(&decoded)?
            .ok_or_else(|| ControlError::NoResource(path.to_string()))?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use std::sync::Arc;
    use streamd_engine::SimEngine;

    fn session() -> Arc<Session> {
        Session::standalone("resolver-test", Arc::new(SimEngine::new()))
    }

    #[test]
    fn resolve_root() {
        let session = session();
        let node = resolve(session.as_node(), "/").unwrap();
        assert_eq!(node.kind(), "session");
    }

    #[test]
    fn resolve_containers() {
        let session = session();
        let node = resolve(session.as_node(), "/pipelines").unwrap();
        assert_eq!(node.kind(), "pipelines");
        let node = resolve(session.as_node(), "/debug").unwrap();
        assert_eq!(node.kind(), "debug");
    }

    #[test]
    fn repeated_and_trailing_slashes_are_normalized() {
        let session = session();
        for path in ["/pipelines", "//pipelines", "/pipelines/", "///pipelines//"] {
            let node = resolve(session.as_node(), path).unwrap();
            assert_eq!(node.kind(), "pipelines", "path {path:?}");
        }
    }

    #[test]
    fn missing_segment_is_no_resource() {
        let session = session();
        let err = resolve(session.as_node(), "/pipelines/ghost").unwrap_err();
        assert!(matches!(err, ControlError::NoResource(_)));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let session = session();
        let err = resolve(session.as_node(), "/Pipelines").unwrap_err();
        assert!(matches!(err, ControlError::NoResource(_)));
    }

    #[test]
    fn percent_encoded_segments_decode() {
        let session = session();
        session
            .pipelines()
            .create("my pipe", "fakesrc ! fakesink")
            .unwrap();
        let node = resolve(session.as_node(), "/pipelines/my%20pipe").unwrap();
        assert_eq!(node.name(), "my pipe");
    }

    #[test]
    fn resolved_node_survives_concurrent_delete() {
        let session = session();
        session
            .pipelines()
            .create("p0", "fakesrc ! fakesink")
            .unwrap();
        let node = resolve(session.as_node(), "/pipelines/p0").unwrap();
        session.pipelines().delete("p0").unwrap();
        // The caller's reference keeps the node readable after removal.
        assert_eq!(node.name(), "p0");
        assert!(node.read().is_ok());
    }
}
