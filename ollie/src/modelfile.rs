//! Modelfile rewriting.
//!
//! A Modelfile refers to weights by local path (`FROM ./model.gguf`). The
//! server only knows blobs, so before a create call every such path is
//! replaced by `@<digest>` of the uploaded file.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;

use crate::blob::BlobDigest;

/// Extension of local model files referenced from Modelfiles.
pub const MODEL_FILE_EXTENSION: &str = "gguf";

/// A whitespace/quote delimited token ending in the model-file extension.
///
/// Group 1 is the path; the trailing delimiter is matched but not part of it,
/// so `m.gguf.bak` is not a match.
static LOCAL_MODEL_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"(?i)([^\s"'@]+\.{MODEL_FILE_EXTENSION})(?:[\s"']|$)"#
    ))
    .expect("local model file pattern is valid")
});

/// Local model-file paths in document order.
fn local_paths(modelfile: &str) -> impl Iterator<Item = regex::Match<'_>> {
    LOCAL_MODEL_FILE
        .captures_iter(modelfile)
        .filter_map(|caps| caps.get(1))
}

/// Replace local model-file paths with `@<digest>` references.
///
/// Digests are consumed in order; each replaces the first remaining match in
/// document order. With fewer digests than matches, the trailing matches are
/// left untouched. Text outside the replaced matches is preserved byte for
/// byte.
///
/// The mapping is positional: the n-th digest lands on the n-th path in the
/// document, whatever that path's name.
pub fn rewrite_modelfile<D: Display>(modelfile: &str, digests: &[D]) -> String {
    let mut out = String::with_capacity(modelfile.len());
    let mut last = 0;
    for (found, digest) in local_paths(modelfile).zip(digests) {
        out.push_str(&modelfile[last..found.start()]);
        out.push('@');
        out.push_str(&digest.to_string());
        last = found.end();
    }
    out.push_str(&modelfile[last..]);
    out
}

/// Build the `files` mapping (basename → digest) sent with a create request.
///
/// Independent of whether [`rewrite_modelfile`] found a path for the file.
/// Later entries win when two files share a basename; `Client::create`
/// rejects such requests before they get here.
pub fn file_digest_map<'a, I>(files: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (&'a str, &'a BlobDigest)>,
{
    files
        .into_iter()
        .map(|(name, digest)| (name.to_owned(), digest.to_string()))
        .collect()
}

/// Count local model-file references in a Modelfile.
#[must_use]
pub fn count_local_files(modelfile: &str) -> usize {
    local_paths(modelfile).count()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod rewrite {
        use super::*;

        #[test]
        fn replaces_from_path() {
            let out = rewrite_modelfile("FROM ./m.gguf\nSYSTEM \"x\"", &["sha256:deadbeef"]);
            assert_eq!(out, "FROM @sha256:deadbeef\nSYSTEM \"x\"");
        }

        #[test]
        fn digests_apply_in_document_order() {
            let doc = "FROM /w/base.gguf\nADAPTER ./lora.gguf\nPARAMETER temperature 0.7\n";
            let out = rewrite_modelfile(doc, &["sha256:aaa", "sha256:bbb"]);
            assert_eq!(
                out,
                "FROM @sha256:aaa\nADAPTER @sha256:bbb\nPARAMETER temperature 0.7\n"
            );
        }

        #[test]
        fn extra_matches_are_left_untouched() {
            let doc = "FROM a.gguf\nADAPTER b.gguf\nADAPTER c.gguf";
            let out = rewrite_modelfile(doc, &["sha256:1"]);
            assert_eq!(out, "FROM @sha256:1\nADAPTER b.gguf\nADAPTER c.gguf");
        }

        #[test]
        fn extra_digests_are_ignored() {
            let out = rewrite_modelfile("FROM a.gguf", &["sha256:1", "sha256:2"]);
            assert_eq!(out, "FROM @sha256:1");
        }

        #[test]
        fn no_digests_means_no_change() {
            let doc = "FROM a.gguf\n";
            assert_eq!(rewrite_modelfile::<&str>(doc, &[]), doc);
        }

        #[test]
        fn base_model_names_are_not_paths() {
            let doc = "FROM llama3:8b\nSYSTEM \"talk like a pirate\"";
            assert_eq!(rewrite_modelfile(doc, &["sha256:1"]), doc);
        }

        #[test]
        fn quoted_path() {
            let out = rewrite_modelfile("FROM \"./models/m.gguf\"", &["sha256:1"]);
            assert_eq!(out, "FROM \"@sha256:1\"");
        }

        #[test]
        fn surrounding_text_is_byte_identical() {
            let doc = "# comment ü\r\nFROM  ./x.gguf  \r\nTEMPLATE \"\"\"{{ .Prompt }}\"\"\"\r\n";
            let out = rewrite_modelfile(doc, &["sha256:f"]);
            assert_eq!(
                out,
                "# comment ü\r\nFROM  @sha256:f  \r\nTEMPLATE \"\"\"{{ .Prompt }}\"\"\"\r\n"
            );
        }

        #[test]
        fn already_rewritten_references_do_not_match() {
            let doc = "FROM @sha256:abc\nADAPTER ./lora.gguf";
            assert_eq!(count_local_files(doc), 1);
            assert_eq!(
                rewrite_modelfile(doc, &["sha256:def"]),
                "FROM @sha256:abc\nADAPTER @sha256:def"
            );
        }

        #[test]
        fn extension_must_end_the_token() {
            let doc = "FROM ./m.gguf.bak\nADAPTER ./real.gguf";
            assert_eq!(count_local_files(doc), 1);
            assert_eq!(
                rewrite_modelfile(doc, &["sha256:aa"]),
                "FROM ./m.gguf.bak\nADAPTER @sha256:aa"
            );
        }

        #[test]
        fn adjacent_paths_separated_by_one_space() {
            let doc = "ADAPTER a.gguf b.gguf";
            assert_eq!(
                rewrite_modelfile(doc, &["sha256:1", "sha256:2"]),
                "ADAPTER @sha256:1 @sha256:2"
            );
        }

        #[test]
        fn accepts_blob_digests() {
            let digest = crate::blob::digest_bytes(b"weights");
            let out = rewrite_modelfile("FROM w.gguf", std::slice::from_ref(&digest));
            assert_eq!(out, format!("FROM @{digest}"));
        }
    }

    mod file_map {
        use super::*;

        #[test]
        fn maps_basenames_to_digests() {
            let a = crate::blob::digest_bytes(b"a");
            let b = crate::blob::digest_bytes(b"b");
            let map = file_digest_map([("a.gguf", &a), ("b.gguf", &b)]);
            assert_eq!(map.len(), 2);
            assert_eq!(map["a.gguf"], a.to_string());
            assert_eq!(map["b.gguf"], b.to_string());
        }

        #[test]
        fn later_duplicate_wins() {
            let a = crate::blob::digest_bytes(b"a");
            let b = crate::blob::digest_bytes(b"b");
            let map = file_digest_map([("m.gguf", &a), ("m.gguf", &b)]);
            assert_eq!(map.len(), 1);
            assert_eq!(map["m.gguf"], b.to_string());
        }
    }
}
