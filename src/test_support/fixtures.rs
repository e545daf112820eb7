//! Test fixtures for common test scenarios.
//!
//! This module provides a small build description, a matching source tree,
//! and helpers that produce archives and git repositories on disk.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use git2::{Commit, Oid, Repository, Signature};

use crate::core::spec::{BuildSpec, MANIFEST_NAME};
use crate::core::workspace::Workspace;
use crate::util::config::Config;

/// Two-source build description used across unit tests.
///
/// `a.c` includes `x.h`; `b.cpp` includes `y.h`, which pulls in `z.h` only
/// when `FOO` is defined.
pub const MINIMAL_SPEC: &str = r#"
[package]
name = "fixture"

[build]
sources = ["a.c", "b.cpp"]
defines = ["FOO"]
include_dirs = ["inc/"]
cflags = ["-O2"]

[android]
output = "android/src/main/cpp"
library = "fixture-jni"
bridge_sources = ["jni.cpp"]
compile_options = ["-fvisibility=hidden", "-w"]
extra_files = ["LICENSE.txt"]

[apple]
output = "ios/Fixture.xcframework"
library = "fixture"
deployment_target = "9.0"
public_symbols = ["fixture_entry"]

[[apple.sdk]]
name = "iphoneos"
archs = ["armv7", "arm64"]

[[apple.sdk]]
name = "iphonesimulator"
archs = ["x86_64"]
"#;

/// Write the source tree [`MINIMAL_SPEC`] describes into `scratch`.
pub fn header_fixture(scratch: &Path) {
    let files = [
        ("a.c", "#include \"x.h\"\nint fixture_entry(void) { return X; }\n"),
        ("inc/x.h", "#define X 1\n"),
        ("b.cpp", "#include \"y.h\"\nint b() { return Y + Z; }\n"),
        ("inc/y.h", "#ifdef FOO\n#include \"z.h\"\n#endif\n#define Y 1\n"),
        ("inc/z.h", "#define Z 2\n"),
        ("LICENSE.txt", "Permission is hereby granted\n"),
    ];
    for (path, content) in files {
        let full = scratch.join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }
}

/// Create a project at `root` with [`MINIMAL_SPEC`] and a populated scratch
/// workspace. User configuration is ignored.
pub fn fixture_workspace(root: &Path) -> Workspace {
    std::fs::write(root.join(MANIFEST_NAME), MINIMAL_SPEC).unwrap();
    let root = root.canonicalize().unwrap();
    let workspace = Workspace::new(
        root,
        BuildSpec::parse(MINIMAL_SPEC).unwrap(),
        Config::default(),
    );
    header_fixture(workspace.scratch());
    workspace
}

/// Write an uncompressed zip archive with the given `(path, content)`
/// entries.
pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// Write a gzip-compressed tarball with the given `(path, content)` entries.
pub fn write_tar_gz(path: &Path, entries: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, name, content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

/// Initialize an empty repository at `<dir>/origin`.
pub fn init_origin(dir: &Path) -> (PathBuf, Repository) {
    let path = dir.join("origin");
    let repo = Repository::init(&path).unwrap();
    (path, repo)
}

/// Write `path` in the repository's working tree and commit it on HEAD.
pub fn commit_file(repo: &Repository, path: &str, content: &str, message: &str) -> Oid {
    let workdir = repo.workdir().unwrap();
    let full = workdir.join(path);
    std::fs::create_dir_all(full.parent().unwrap()).unwrap();
    std::fs::write(&full, content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(path)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

    let sig = Signature::now("Fixture", "fixture@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&Commit> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

/// Register the repository at `url` as a submodule of `repo` at `path` and
/// commit the gitlink.
pub fn add_submodule(repo: &Repository, url: &str, path: &str) -> Oid {
    let mut submodule = repo.submodule(url, Path::new(path), true).unwrap();
    submodule.clone(None).unwrap();
    submodule.add_to_index(true).unwrap();
    submodule.add_finalize().unwrap();

    let mut index = repo.index().unwrap();
    index.read(true).unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("Fixture", "fixture@example.com").unwrap();
    let parent = repo.head().unwrap().peel_to_commit().unwrap();

    repo.commit(
        Some("HEAD"),
        &sig,
        &sig,
        &format!("add {}", path),
        &tree,
        &[&parent],
    )
    .unwrap()
}
