//! Recache jobs and the queue batches that carry them.

/// Largest batch the queue accepts in one send.
pub const MAX_BATCH_SIZE: usize = 10;
/// Sanitized URL characters kept after the digest; 32 + 47 stays under the 80 character id limit.
pub const JOB_ID_SUFFIX_LEN: usize = 47;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecacheJob {
    pub url: String,
    pub job_id: String,
}

impl RecacheJob {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let job_id = job_id(&url);
        Self { url, job_id }
    }
}

/// Derive the queue entry id for a URL.
///
/// The id is the hex MD5 digest of the URL followed by the tail of its sanitized form,
/// so it depends on nothing but the URL.
pub fn job_id(url: &str) -> String {
    let sanitized = sanitize(url);
    let tail = sanitized.len().saturating_sub(JOB_ID_SUFFIX_LEN);
    format!("{:x}{}", md5::compute(url.as_bytes()), &sanitized[tail..])
}

/// Replace each run of characters outside `[A-Za-z0-9_-]` with a single `_`.
fn sanitize(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    let mut in_run = false;
    for ch in url.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            out.push(ch);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

/// Up to [`MAX_BATCH_SIZE`] jobs sent to the queue in one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecacheBatch {
    jobs: Vec<RecacheJob>,
}

impl RecacheBatch {
    pub fn jobs(&self) -> &[RecacheJob] {
        &self.jobs
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.jobs.iter().map(|job| job.url.as_str())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Split URLs into consecutive batches, preserving order within and across batches.
pub fn plan_batches(urls: &[String]) -> Vec<RecacheBatch> {
    urls.chunks(MAX_BATCH_SIZE)
        .map(|chunk| RecacheBatch {
            jobs: chunk.iter().map(|url| RecacheJob::new(url.as_str())).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(count: usize) -> Vec<String> {
        (0..count)
            .map(|index| format!("https://example.com/page/{index}"))
            .collect()
    }

    #[test]
    fn job_id_is_deterministic() {
        let first = job_id("https://example.com/a");
        let second = job_id("https://example.com/a");
        assert_eq!(first, second);
        assert_ne!(first, job_id("https://example.com/b"));
    }

    #[test]
    fn job_id_is_digest_then_sanitized_url() {
        let url = "https://example.com/a";
        let expected = format!("{:x}https_example_com_a", md5::compute(url));
        assert_eq!(job_id(url), expected);
    }

    #[test]
    fn sanitize_collapses_runs_of_disallowed_characters() {
        assert_eq!(sanitize("https://a.b/c?d=e&f"), "https_a_b_c_d_e_f");
        assert_eq!(sanitize("keep-this_one"), "keep-this_one");
        assert_eq!(sanitize("café/ü"), "caf_");
    }

    #[test]
    fn long_urls_keep_only_the_tail() {
        let url = format!("https://example.com/{}", "segment-".repeat(20));
        let id = job_id(&url);
        let sanitized = sanitize(&url);
        assert_eq!(id.len(), 32 + JOB_ID_SUFFIX_LEN);
        assert!(id.ends_with(&sanitized[sanitized.len() - JOB_ID_SUFFIX_LEN..]));
    }

    #[test]
    fn ids_differ_when_sanitized_tails_collide() {
        let a = job_id("https://example.com/a?b");
        let b = job_id("https://example.com/a&b");
        assert_eq!(a[32..], b[32..]);
        assert_ne!(a, b);
    }

    #[test]
    fn batches_are_bounded_and_ordered() {
        for count in [1usize, 9, 10, 11, 25, 1000] {
            let input = urls(count);
            let batches = plan_batches(&input);
            assert_eq!(batches.len(), count.div_ceil(MAX_BATCH_SIZE));
            assert!(batches.iter().all(|batch| batch.len() <= MAX_BATCH_SIZE));

            let flattened: Vec<&str> = batches.iter().flat_map(|batch| batch.urls()).collect();
            assert_eq!(flattened, input.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }

    #[test]
    fn no_urls_plan_no_batches() {
        assert!(plan_batches(&[]).is_empty());
    }
}
