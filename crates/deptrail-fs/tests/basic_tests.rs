//! Basic tests for FileSystem implementations.

use deptrail_fs::{FileSystem, MemoryFileSystem, NativeFileSystem};
use std::path::Path;
use tempfile::TempDir;

#[tokio::test]
async fn test_native_read_write() {
    let temp_dir = TempDir::new().unwrap();
    let fs = NativeFileSystem::new(temp_dir.path()).unwrap();

    let lockfile = temp_dir.path().join("Gemfile.lock");
    fs.write(&lockfile, "GEM\n").await.unwrap();

    assert_eq!(fs.read_to_string(&lockfile).await.unwrap(), "GEM\n");
}

#[tokio::test]
async fn test_native_missing_file_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let fs = NativeFileSystem::new(temp_dir.path()).unwrap();

    let missing = temp_dir.path().join("uv.lock");
    assert!(!fs.exists(&missing).await.unwrap());
    assert!(!fs.metadata(&missing).await.unwrap().exists);

    let err = fs.read_to_string(&missing).await.unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

#[tokio::test]
async fn test_native_rejects_traversal() {
    let temp_dir = TempDir::new().unwrap();
    let inner = temp_dir.path().join("project");
    std::fs::create_dir_all(&inner).unwrap();
    std::fs::write(temp_dir.path().join("secret.txt"), "x").unwrap();

    let fs = NativeFileSystem::new(&inner).unwrap();
    let err = fs
        .read_to_string(&inner.join("../secret.txt"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn test_native_create_makes_root_and_nested_dirs() {
    let temp_dir = TempDir::new().unwrap();
    let cache_root = temp_dir.path().join("cache");
    let fs = NativeFileSystem::create(&cache_root).unwrap();

    let nested = cache_root.join("npm");
    fs.create_dir_all(&nested).await.unwrap();
    fs.write(&nested.join("react.json"), "{}").await.unwrap();

    let metadata = fs.metadata(&nested.join("react.json")).await.unwrap();
    assert!(metadata.exists);
    assert!(metadata.is_file);
    assert_eq!(metadata.size, 2);
}

#[tokio::test]
async fn test_memory_read_write_rename() {
    let fs = MemoryFileSystem::new("/project").unwrap();
    fs.add_file("package.json", r#"{"name":"demo"}"#).unwrap();

    assert!(fs.exists(Path::new("/project/package.json")).await.unwrap());
    assert_eq!(
        fs.read_to_string(Path::new("package.json")).await.unwrap(),
        r#"{"name":"demo"}"#
    );

    fs.write(Path::new("config.toml.tmp"), "a = 1").await.unwrap();
    fs.rename(Path::new("config.toml.tmp"), Path::new("config.toml"))
        .await
        .unwrap();
    assert!(!fs.exists(Path::new("config.toml.tmp")).await.unwrap());
    assert_eq!(fs.len(), 2);
}

#[tokio::test]
async fn test_memory_rejects_escape() {
    let fs = MemoryFileSystem::new("/project").unwrap();
    assert!(fs.read(Path::new("/other/file")).await.is_err());
    assert!(fs.read(Path::new("../file")).await.is_err());
}
