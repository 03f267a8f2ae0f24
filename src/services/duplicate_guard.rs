use async_trait::async_trait;

/// One-shot paraphrasing hook handed to the guard. Returns `None` when no
/// rewrite was produced.
#[async_trait]
pub trait Rewriter: Send + Sync {
    async fn rewrite(&self, text: &str) -> Option<String>;
}

/// Cross-document variation and near-duplicate protection.
///
/// The corpus comparison lives outside this crate; the pipeline only calls
/// through this seam.
#[async_trait]
pub trait DuplicateGuard: Send + Sync {
    fn inject_variation(&self, prompt: &str, angle: Option<&str>, context_tag: &str) -> String;

    /// Returns the text to keep. A guard that finds the text too close to
    /// existing content may call `rewriter` and return its output instead.
    async fn guard_duplicates(&self, context_tag: &str, text: &str, rewriter: &dyn Rewriter)
        -> String;
}

/// Leaves prompts and outputs untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughGuard;

#[async_trait]
impl DuplicateGuard for PassthroughGuard {
    fn inject_variation(&self, prompt: &str, _angle: Option<&str>, _context_tag: &str) -> String {
        prompt.to_string()
    }

    async fn guard_duplicates(
        &self,
        _context_tag: &str,
        text: &str,
        _rewriter: &dyn Rewriter,
    ) -> String {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingRewriter {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Rewriter for CountingRewriter {
        async fn rewrite(&self, text: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some(text.to_uppercase())
        }
    }

    #[tokio::test]
    async fn passthrough_never_rewrites() {
        let rewriter = CountingRewriter {
            calls: AtomicUsize::new(0),
        };
        let guard = PassthroughGuard;

        assert_eq!(guard.inject_variation("prompt", Some("costs"), "tag"), "prompt");
        assert_eq!(guard.guard_duplicates("tag", "<p>x</p>", &rewriter).await, "<p>x</p>");
        assert_eq!(rewriter.calls.load(Ordering::SeqCst), 0);
    }
}
