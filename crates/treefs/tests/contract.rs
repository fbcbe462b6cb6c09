//! Behavior every backend must share.
//!
//! Each check is written once against `Filesystem` and instantiated for
//! the in-memory engine and the host backend by `contract!` below.
//! Expected errors are compared through their display strings, which name
//! both the condition and the path.

use std::collections::BTreeSet;

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use treefs::{Filesystem, FilesystemExt, FsError, FsPath, FsResult, MemoryFs, OpenFile};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn memory_fs() -> (MemoryFs, ()) {
    init_tracing();
    (MemoryFs::new(), ())
}

#[cfg(unix)]
fn native_fs() -> (treefs::NativeFs, TempDir) {
    init_tracing();
    let dir = TempDir::new().unwrap();
    (treefs::NativeFs::new(dir.path()), dir)
}

#[track_caller]
fn assert_fails<T>(result: FsResult<T>, expected: FsError) {
    match result {
        Ok(_) => panic!("expected failure: {expected}"),
        Err(err) => assert_eq!(err.to_string(), expected.to_string()),
    }
}

fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Files
// ============================================================================

fn create_file<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let child = tempdir.descendant(["unittesting"]);

    let mut file = fs.create_file(&child).unwrap();
    file.write_text("some things!").unwrap();
    drop(file);

    assert_eq!(fs.contents_of(&child).unwrap(), "some things!");
    assert!(fs.is_file(&child));
}

fn create_file_existing_file<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let child = tempdir.descendant(["unittesting"]);
    fs.set_contents(&child, b"something").unwrap();

    assert_fails(fs.create_file(&child), FsError::FileExists(child.clone()));
    assert_eq!(fs.contents_of(&child).unwrap(), "something");
}

fn create_file_existing_directory<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let child = tempdir.descendant(["unittesting"]);
    fs.create_directory(&child).unwrap();

    assert_fails(fs.create_file(&child), FsError::FileExists(child.clone()));
}

fn create_file_existing_link<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let child = tempdir.descendant(["unittesting"]);
    fs.link(&tempdir.descendant(["dangling"]), &child).unwrap();

    assert_fails(fs.create_file(&child), FsError::FileExists(child.clone()));
}

fn create_file_missing_parent<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let orphan = tempdir.descendant(["nonexistent", "unittesting"]);

    assert_fails(fs.create_file(&orphan), FsError::FileNotFound(orphan.parent()));
}

fn open_read_missing<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let missing = tempdir.descendant(["missing"]);

    assert_fails(fs.open_file(&missing, "r"), FsError::FileNotFound(missing.clone()));
    assert!(!fs.exists(&missing));
}

fn open_directory<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    for mode in ["r", "rb", "w", "a"] {
        assert_fails(fs.open_file(&tempdir, mode), FsError::IsADirectory(tempdir.clone()));
    }
}

fn open_with_invalid_mode<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let child = tempdir.descendant(["nope", "deeper"]);

    assert_fails(fs.open_file(&child, "rwx"), FsError::InvalidMode("rwx".into()));
}

fn write_creates_missing_file<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let child = tempdir.descendant(["new"]);

    fs.open_file(&child, "wb").unwrap().write_bytes(b"\x00\x01").unwrap();
    assert_eq!(fs.bytes_of(&child).unwrap(), b"\x00\x01");
}

fn remove_file<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let child = tempdir.descendant(["unittesting"]);
    fs.touch(&child).unwrap();

    fs.remove_file(&child).unwrap();
    assert!(!fs.exists(&child));
    assert_fails(fs.remove_file(&child), FsError::FileNotFound(child.clone()));
}

fn remove_file_on_directory<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let directory = tempdir.descendant(["directory"]);
    fs.create_directory(&directory).unwrap();

    assert_fails(fs.remove_file(&directory), FsError::PermissionError(directory.clone()));
    assert!(fs.is_dir(&directory));
}

fn remove_file_on_link_keeps_target<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let source = tempdir.descendant(["source"]);
    let to = tempdir.descendant(["to"]);
    fs.touch(&source).unwrap();
    fs.link(&source, &to).unwrap();

    fs.remove_file(&to).unwrap();
    assert!(!fs.is_link(&to));
    assert!(fs.is_file(&source));
}

// ============================================================================
// Directories
// ============================================================================

fn create_directory<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let directory = tempdir.descendant(["dir"]);
    assert!(!fs.is_dir(&directory));

    fs.create_directory(&directory).unwrap();
    assert!(fs.is_dir(&directory));
    assert!(fs.list_directory(&directory).unwrap().is_empty());

    assert_fails(fs.create_directory(&directory), FsError::FileExists(directory.clone()));
}

fn create_directory_missing_parent<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let directory = tempdir.descendant(["some", "child", "dir"]);

    assert_fails(
        fs.create_directory(&directory),
        FsError::FileNotFound(directory.parent()),
    );
}

fn create_beneath_a_file<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let file = tempdir.descendant(["a"]);
    fs.touch(&file).unwrap();
    let deep = file.descendant(["b", "c"]);

    assert_fails(fs.create_directory(&deep), FsError::NotADirectory(deep.parent()));
    assert_fails(fs.create_file(&deep), FsError::NotADirectory(deep.clone()));
    assert_fails(fs.list_directory(&file), FsError::NotADirectory(file.clone()));
}

fn list_directory<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    assert!(fs.list_directory(&tempdir).unwrap().is_empty());

    fs.touch(&tempdir.descendant(["a"])).unwrap();
    fs.create_directory(&tempdir.descendant(["b"])).unwrap();

    assert_eq!(fs.list_directory(&tempdir).unwrap(), names(&["a", "b"]));
}

fn list_missing_directory<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let missing = tempdir.descendant(["missing"]);

    assert_fails(fs.list_directory(&missing), FsError::FileNotFound(missing.clone()));
}

fn remove_empty_directory<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let directory = tempdir.descendant(["d"]);
    fs.create_directory(&directory).unwrap();

    fs.remove_empty_directory(&directory).unwrap();
    assert!(!fs.exists(&directory));
    assert_fails(
        fs.remove_empty_directory(&directory),
        FsError::FileNotFound(directory.clone()),
    );
}

fn remove_nonempty_directory<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    fs.touch(&tempdir.descendant(["a"])).unwrap();

    assert_fails(
        fs.remove_empty_directory(&tempdir),
        FsError::DirectoryNotEmpty(tempdir.clone()),
    );
}

fn remove_empty_directory_rejects_non_directories<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let file = tempdir.descendant(["file"]);
    let directory = tempdir.descendant(["dir"]);
    let link = tempdir.descendant(["link"]);
    fs.touch(&file).unwrap();
    fs.create_directory(&directory).unwrap();
    fs.link(&directory, &link).unwrap();

    assert_fails(fs.remove_empty_directory(&file), FsError::NotADirectory(file.clone()));
    assert_fails(fs.remove_empty_directory(&link), FsError::NotADirectory(link.clone()));
    assert!(fs.is_dir(&directory));
}

fn temporary_directory<F: Filesystem>(fs: &F) {
    let first = fs.temporary_directory().unwrap();
    let second = fs.temporary_directory().unwrap();

    assert_ne!(first, second);
    assert!(fs.is_dir(&first));
    assert!(fs.list_directory(&first).unwrap().is_empty());
}

// ============================================================================
// Links
// ============================================================================

fn link_transparent_for_reads_and_writes<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let source = tempdir.descendant(["source"]);
    let to = tempdir.descendant(["to"]);
    fs.set_contents(&source, b"hello").unwrap();
    fs.link(&source, &to).unwrap();

    assert_eq!(fs.contents_of(&to).unwrap(), "hello");

    fs.open_file(&to, "a").unwrap().write_text(" there").unwrap();
    assert_eq!(fs.contents_of(&source).unwrap(), "hello there");
    assert!(fs.is_file(&to));
    assert!(fs.is_link(&to));
}

fn link_to_directory<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let source = tempdir.descendant(["source"]);
    let to = tempdir.descendant(["to"]);
    fs.create_directory(&source).unwrap();
    fs.link(&source, &to).unwrap();

    fs.touch(&to.descendant(["inside"])).unwrap();
    assert_eq!(fs.list_directory(&source).unwrap(), names(&["inside"]));
    assert_eq!(fs.list_directory(&to).unwrap(), names(&["inside"]));
    assert!(fs.is_dir(&to));
}

fn link_chain<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let source = tempdir.descendant(["source"]);
    let first = tempdir.descendant(["first"]);
    let second = tempdir.descendant(["second"]);
    fs.set_contents(&source, b"end of the chain").unwrap();
    fs.link(&source, &first).unwrap();
    fs.link(&first, &second).unwrap();

    assert_eq!(fs.contents_of(&second).unwrap(), "end of the chain");
    assert_eq!(fs.readlink(&second).unwrap(), first);
    assert_eq!(fs.realpath(&second).unwrap(), source);
}

fn relative_link<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let directory = tempdir.descendant(["dir"]);
    fs.create_directory(&directory).unwrap();
    fs.set_contents(&directory.descendant(["target"]), b"relative").unwrap();

    let link = directory.descendant(["link"]);
    fs.link(&FsPath::from("target"), &link).unwrap();

    assert_eq!(fs.readlink(&link).unwrap(), FsPath::from("target"));
    assert_eq!(fs.contents_of(&link).unwrap(), "relative");
    assert_eq!(fs.realpath(&link).unwrap(), directory.descendant(["target"]));
}

fn link_existing<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let to = tempdir.descendant(["to"]);
    fs.touch(&to).unwrap();

    assert_fails(
        fs.link(&tempdir.descendant(["source"]), &to),
        FsError::FileExists(to.clone()),
    );
}

fn link_missing_parent<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let orphan = tempdir.descendant(["nonexistent", "orphan"]);

    assert_fails(
        fs.link(&tempdir.descendant(["source"]), &orphan),
        FsError::FileNotFound(orphan.parent()),
    );
}

fn dangling_link<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let source = tempdir.descendant(["nowhere"]);
    let to = tempdir.descendant(["to"]);
    fs.link(&source, &to).unwrap();

    assert!(fs.is_link(&to));
    assert!(!fs.exists(&to));
    assert!(!fs.is_file(&to));
    assert_fails(fs.open_file(&to, "r"), FsError::FileNotFound(to.clone()));

    // Writing through it brings the target into existence.
    fs.open_file(&to, "w").unwrap().write_text("now here").unwrap();
    assert_eq!(fs.contents_of(&source).unwrap(), "now here");
}

fn readlink_errors<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let file = tempdir.descendant(["file"]);
    let missing = tempdir.descendant(["missing"]);
    fs.touch(&file).unwrap();

    assert_fails(fs.readlink(&file), FsError::NotASymlink(file.clone()));
    assert_fails(fs.readlink(&tempdir), FsError::NotASymlink(tempdir.clone()));
    assert_fails(fs.readlink(&missing), FsError::FileNotFound(missing.clone()));
}

fn realpath_keeps_missing_components<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let source = tempdir.descendant(["source"]);
    let to = tempdir.descendant(["to"]);
    fs.create_directory(&source).unwrap();
    fs.link(&source, &to).unwrap();

    let missing = to.descendant(["not", "there"]);
    assert_eq!(
        fs.realpath(&missing).unwrap(),
        source.descendant(["not", "there"]),
    );
    assert_eq!(fs.realpath(&tempdir).unwrap(), tempdir);
}

// ============================================================================
// Loops
// ============================================================================

fn self_loop<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let lp = tempdir.descendant(["loop"]);
    fs.link(&lp, &lp).unwrap();

    for mode in ["r", "rb", "w", "wt", "a", "ab"] {
        assert!(matches!(fs.open_file(&lp, mode), Err(FsError::SymbolicLoop(_))));
    }
    assert!(matches!(fs.realpath(&lp), Err(FsError::SymbolicLoop(_))));
    assert!(matches!(
        fs.realpath(&lp.descendant(["child"])),
        Err(FsError::SymbolicLoop(_))
    ));

    assert!(fs.is_link(&lp));
    assert!(!fs.exists(&lp));
    assert!(!fs.is_dir(&lp));
    assert!(!fs.is_file(&lp));
}

fn mutual_loop<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let chain: Vec<FsPath> = ["don't", "fall", "in", "the", "hole"]
        .into_iter()
        .map(|name| tempdir.descendant([name]))
        .collect();
    for pair in chain.windows(2) {
        fs.link(&pair[0], &pair[1]).unwrap();
    }
    fs.link(&chain[chain.len() - 1], &chain[0]).unwrap();

    let lp = &chain[0];
    assert!(matches!(fs.open_file(lp, "r"), Err(FsError::SymbolicLoop(_))));
    assert!(matches!(fs.open_file(lp, "a"), Err(FsError::SymbolicLoop(_))));
    assert!(matches!(
        fs.open_file(&lp.descendant(["child"]), "w"),
        Err(FsError::SymbolicLoop(_))
    ));
    assert!(matches!(fs.realpath(lp), Err(FsError::SymbolicLoop(_))));
}

fn create_beneath_loop<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let lp = tempdir.descendant(["loop"]);
    fs.link(&lp, &lp).unwrap();
    let deep = lp.descendant(["child", "path"]);

    let reported = FsError::SymbolicLoop(lp.descendant(["child"]));
    assert_fails(fs.create_file(&deep), FsError::SymbolicLoop(deep.parent()));
    assert_fails(fs.create_directory(&deep), reported);
}

/// Every lookup beneath a regular file names the full path.
fn missing_beneath_a_file<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let file = tempdir.descendant(["file"]);
    fs.touch(&file).unwrap();
    let child = file.descendant(["non_existing", "thing"]);

    let expected = || FsError::NotADirectory(child.clone());
    assert_fails(fs.list_directory(&child), expected());
    assert_fails(fs.remove_empty_directory(&child), expected());
    assert_fails(fs.remove_file(&child), expected());
    assert_fails(fs.readlink(&child), expected());
}

/// Every lookup beneath a looping link names the link plus one segment.
fn missing_beneath_a_loop<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let lp = tempdir.descendant(["loop"]);
    fs.link(&lp, &lp).unwrap();
    let child = lp.descendant(["non_existing", "thing"]);

    let expected = || FsError::SymbolicLoop(lp.descendant(["non_existing"]));
    assert_fails(fs.list_directory(&child), expected());
    assert_fails(fs.remove_empty_directory(&child), expected());
    assert_fails(fs.remove_file(&child), expected());
    assert_fails(fs.readlink(&child), expected());
}

// ============================================================================
// Predicates and helpers
// ============================================================================

fn stat_of_missing_children<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let file = tempdir.descendant(["file"]);
    fs.touch(&file).unwrap();

    for base in [&tempdir, &file] {
        let child = base.descendant(["non_existing", "thing"]);
        assert_eq!(
            (fs.exists(&child), fs.is_dir(&child), fs.is_file(&child), fs.is_link(&child)),
            (false, false, false, false),
        );
    }
}

fn recursive_remove<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let outside = fs.temporary_directory().unwrap();
    fs.touch(&outside.descendant(["keep"])).unwrap();

    fs.create_directory(&tempdir.descendant(["sub"])).unwrap();
    fs.touch(&tempdir.descendant(["sub", "leaf"])).unwrap();
    fs.link(&outside, &tempdir.descendant(["escape"])).unwrap();

    fs.remove(&tempdir).unwrap();
    assert!(!fs.exists(&tempdir));
    assert!(fs.is_file(&outside.descendant(["keep"])));
}

fn non_ascii_round_trip<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    let child = tempdir.descendant(["unicode"]);

    fs.open_file(&child, "wt").unwrap().write_text("☃ snowman ünïcode").unwrap();
    let text = fs.open_file(&child, "rt").unwrap().read_text().unwrap();
    assert_eq!(text, "☃ snowman ünïcode");
}

fn glob_children<F: Filesystem>(fs: &F) {
    let tempdir = fs.temporary_directory().unwrap();
    for name in ["one.txt", "two.txt", "three.md"] {
        fs.touch(&tempdir.descendant([name])).unwrap();
    }

    let pattern = glob::Pattern::new("*.txt").unwrap();
    let matched = fs.glob_children(&tempdir, &pattern).unwrap();
    let expected: BTreeSet<FsPath> = ["one.txt", "two.txt"]
        .into_iter()
        .map(|name| tempdir.descendant([name]))
        .collect();
    assert_eq!(matched, expected);
}

macro_rules! contract {
    ($backend:ident, $setup:path) => {
        contract!(@cases $backend, $setup, [
            create_file,
            create_file_existing_file,
            create_file_existing_directory,
            create_file_existing_link,
            create_file_missing_parent,
            open_read_missing,
            open_directory,
            open_with_invalid_mode,
            write_creates_missing_file,
            remove_file,
            remove_file_on_directory,
            remove_file_on_link_keeps_target,
            create_directory,
            create_directory_missing_parent,
            create_beneath_a_file,
            list_directory,
            list_missing_directory,
            remove_empty_directory,
            remove_nonempty_directory,
            remove_empty_directory_rejects_non_directories,
            temporary_directory,
            link_transparent_for_reads_and_writes,
            link_to_directory,
            link_chain,
            relative_link,
            link_existing,
            link_missing_parent,
            dangling_link,
            readlink_errors,
            realpath_keeps_missing_components,
            self_loop,
            mutual_loop,
            create_beneath_loop,
            missing_beneath_a_file,
            missing_beneath_a_loop,
            stat_of_missing_children,
            recursive_remove,
            non_ascii_round_trip,
            glob_children,
        ]);
    };
    (@cases $backend:ident, $setup:path, [$($case:ident),* $(,)?]) => {
        mod $backend {
            $(
                #[test]
                fn $case() {
                    let (fs, _guard) = $setup();
                    super::$case(&fs);
                }
            )*
        }
    };
}

contract!(memory, crate::memory_fs);

#[cfg(unix)]
contract!(native, crate::native_fs);
