//! Header-closure inference.
//!
//! Every source in the manifest is run through the preprocessor in
//! dependency-reporting mode (`-M`) with the same definitions and include
//! paths the real compiles use. The union of the reported headers that live
//! inside the scratch workspace is the header closure: exactly the headers
//! the Android tree needs next to the sources.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use rayon::prelude::*;

use crate::builder::flags::inference_flags;
use crate::builder::runner::{OutputMode, ToolchainRunner};
use crate::builder::toolchain::{path_arg, CommandSpec};
use crate::core::language::Language;
use crate::core::spec::BuildSpec;
use crate::util::errors::VendorError;
use crate::util::fs::{normalize_lexically, relative_inside, to_slash};

/// Headers transitively included by the source manifest, relative to the
/// scratch root with forward slashes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderClosure {
    headers: BTreeSet<String>,
}

impl HeaderClosure {
    pub fn contains(&self, header: &str) -> bool {
        self.headers.contains(header)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Supplemental files that inference already found.
    ///
    /// Such entries no longer need to be listed by hand.
    pub fn stale_overrides<'a>(&self, extra_files: &'a [String]) -> Vec<&'a str> {
        extra_files
            .iter()
            .map(String::as_str)
            .filter(|f| self.contains(f))
            .collect()
    }
}

impl FromIterator<String> for HeaderClosure {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        HeaderClosure {
            headers: iter.into_iter().collect(),
        }
    }
}

/// Infer the header closure of the manifest.
///
/// Sources are preprocessed in parallel. Any preprocessor failure aborts the
/// whole inference; no partial closure is returned.
pub fn infer_headers(
    spec: &BuildSpec,
    scratch: &Path,
    preprocessor: &Path,
    runner: &dyn ToolchainRunner,
) -> Result<HeaderClosure> {
    let flags = inference_flags(spec, scratch);

    let mut roots = vec![normalize_lexically(scratch)];
    if let Ok(canonical) = scratch.canonicalize() {
        if !roots.contains(&canonical) {
            roots.push(canonical);
        }
    }

    let reports = spec
        .sources
        .par_iter()
        .map(|source| {
            let path = scratch.join(source);
            let cmd = CommandSpec::new(preprocessor)
                .arg("-M")
                .args(flags.for_language(Language::of(source)).iter().cloned())
                .arg(path_arg(&path));

            let output = runner.execute(&cmd, OutputMode::Capture)?;
            if !output.success {
                return Err(VendorError::Preprocess {
                    source_path: PathBuf::from(source),
                    status: output.status(),
                    stderr: output.stderr,
                }
                .into());
            }

            tracing::debug!("Inferred dependencies of {}", source);
            Ok(parse_dependency_report(&output.stdout))
        })
        .collect::<Result<Vec<_>>>()?;

    let closure: HeaderClosure = reports
        .into_iter()
        .flatten()
        .filter_map(|dep| {
            let dep = normalize_lexically(&dep);
            roots
                .iter()
                .find_map(|root| relative_inside(root, &dep))
                .map(|rel| to_slash(&rel))
        })
        .collect();

    tracing::info!(
        "Inferred {} headers from {} sources",
        closure.len(),
        spec.sources.len()
    );

    Ok(closure)
}

/// Extract the header dependencies from a make-style dependency report.
///
/// The report names the object target, then the primary source, then every
/// header it includes. Lines may be joined with trailing backslashes, and
/// spaces inside paths are backslash-escaped. The target and the primary
/// source are dropped.
pub fn parse_dependency_report(report: &str) -> Vec<PathBuf> {
    let joined = report.replace("\\\r\n", " ").replace("\\\n", " ");

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = joined.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&' ') => {
                current.push(' ');
                chars.next();
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    let mut deps = Vec::new();
    let mut seen_target = false;
    for token in tokens {
        if !seen_target {
            if token == ":" || token.ends_with(':') {
                seen_target = true;
            }
            continue;
        }
        deps.push(PathBuf::from(token));
    }

    // first dependency is the primary source
    if !deps.is_empty() {
        deps.remove(0);
    }
    deps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::runner::ToolOutput;
    use crate::core::spec::BuildSpec;
    use crate::test_support::fixtures::{header_fixture, MINIMAL_SPEC};
    use crate::test_support::MockRunner;
    use tempfile::TempDir;

    #[test]
    fn test_parse_continued_report() {
        let report = "a.o: /ws/tmp/a.c /ws/tmp/inc/x.h \\\n  /ws/tmp/inc/y.h \\\n  /usr/include/stdio.h\n";
        assert_eq!(
            parse_dependency_report(report),
            vec![
                PathBuf::from("/ws/tmp/inc/x.h"),
                PathBuf::from("/ws/tmp/inc/y.h"),
                PathBuf::from("/usr/include/stdio.h"),
            ]
        );
    }

    #[test]
    fn test_parse_escaped_spaces() {
        let report = "b.o: /ws/my\\ tmp/b.cpp /ws/my\\ tmp/inc/z.h\n";
        assert_eq!(
            parse_dependency_report(report),
            vec![PathBuf::from("/ws/my tmp/inc/z.h")]
        );
    }

    #[test]
    fn test_parse_source_without_headers() {
        assert!(parse_dependency_report("a.o: a.c\n").is_empty());
        assert!(parse_dependency_report("").is_empty());
    }

    /// Mock preprocessor that reports `a.c -> x.h` and
    /// `b.cpp -> y.h -> z.h, <system header>`.
    fn reporting_runner(scratch: PathBuf) -> MockRunner {
        MockRunner::with_handler(move |cmd| {
            let source = cmd.args.last()?;
            let s = scratch.display();
            let report = if source.ends_with("a.c") {
                format!("a.o: {s}/a.c \\\n  {s}/inc/../inc/x.h\n")
            } else {
                format!("b.o: {s}/b.cpp {s}/inc/y.h {s}/inc/z.h \\\n  /usr/include/c++/v1/vector\n")
            };
            Some(ToolOutput::success(report))
        })
    }

    #[test]
    fn test_closure_is_union_restricted_to_scratch() {
        let tmp = TempDir::new().unwrap();
        let scratch = tmp.path().to_path_buf();
        let spec = BuildSpec::parse(MINIMAL_SPEC).unwrap();
        let runner = reporting_runner(scratch.clone());

        let closure = infer_headers(&spec, &scratch, Path::new("clang"), &runner).unwrap();

        let headers: Vec<_> = closure.iter().collect();
        assert_eq!(headers, vec!["inc/x.h", "inc/y.h", "inc/z.h"]);

        // C++ sources are preprocessed under the language standard
        let calls = runner.calls();
        let cxx = calls
            .iter()
            .find(|c| c.args.last().unwrap().ends_with("b.cpp"))
            .unwrap();
        assert!(cxx.args.contains(&"-std=c++11".to_string()));
        assert_eq!(cxx.args[0], "-M");
        let c = calls
            .iter()
            .find(|c| c.args.last().unwrap().ends_with("a.c"))
            .unwrap();
        assert!(!c.args.contains(&"-std=c++11".to_string()));
    }

    #[test]
    fn test_stale_overrides() {
        let closure: HeaderClosure = ["inc/x.h".to_string()].into_iter().collect();
        let extras = vec!["LICENSE.txt".to_string(), "inc/x.h".to_string()];
        assert_eq!(closure.stale_overrides(&extras), vec!["inc/x.h"]);
    }

    #[test]
    fn test_preprocessor_failure_names_source() {
        let runner = MockRunner::with_handler(|cmd| {
            if cmd.args.last()?.ends_with("b.cpp") {
                Some(ToolOutput::failure(1, "fatal error: 'z.h' file not found"))
            } else {
                Some(ToolOutput::success("a.o: a.c\n"))
            }
        });
        let spec = BuildSpec::parse(MINIMAL_SPEC).unwrap();

        let err = infer_headers(&spec, Path::new("/ws/tmp"), Path::new("clang"), &runner)
            .unwrap_err();
        match err.downcast_ref::<VendorError>() {
            Some(VendorError::Preprocess {
                source_path,
                stderr,
                ..
            }) => {
                assert_eq!(source_path, &PathBuf::from("b.cpp"));
                assert!(stderr.contains("z.h"));
            }
            other => panic!("expected preprocess error, got {:?}", other),
        }
    }

    #[test]
    fn test_real_preprocessor_if_available() {
        let Some(clang) = crate::util::process::find_executable("clang") else {
            return;
        };
        let tmp = TempDir::new().unwrap();
        header_fixture(tmp.path());
        let spec = BuildSpec::parse(MINIMAL_SPEC).unwrap();

        let closure = infer_headers(
            &spec,
            tmp.path(),
            &clang,
            &crate::builder::runner::ProcessRunner,
        )
        .unwrap();

        // z.h is only reachable through y.h
        let headers: Vec<_> = closure.iter().collect();
        assert_eq!(headers, vec!["inc/x.h", "inc/y.h", "inc/z.h"]);
    }

    #[test]
    fn test_real_preprocessor_honours_defines() {
        let Some(clang) = crate::util::process::find_executable("clang") else {
            return;
        };
        let tmp = TempDir::new().unwrap();
        header_fixture(tmp.path());
        let spec = BuildSpec::parse(&MINIMAL_SPEC.replace("defines = [\"FOO\"]", "defines = []"))
            .unwrap();

        let closure = infer_headers(
            &spec,
            tmp.path(),
            &clang,
            &crate::builder::runner::ProcessRunner,
        )
        .unwrap();

        assert!(closure.contains("inc/y.h"));
        assert!(!closure.contains("inc/z.h"));
    }
}
