use rug::Integer;
use tempfile::TempDir;
use timerelease_storage::{Config, Storage, StorageError};
use timerelease_types::TimeLockPackage;

fn sample_package(iterations: u64) -> TimeLockPackage {
    TimeLockPackage {
        base: Integer::from(5),
        modulus: Integer::from(3233),
        iterations,
        secret_iv: [7; 16],
        encrypted_secret: vec![8; 32],
        key_iv: [9; 16],
        encrypted_key: vec![10; 32],
    }
}

#[test]
fn test_write_then_read() {
    let dir = TempDir::new().unwrap();
    let storage = Storage::new(Config::new(dir.path().to_path_buf())).unwrap();

    assert!(!storage.has_package());
    storage.write_package(&sample_package(1000)).unwrap();
    assert!(storage.has_package());

    let package = storage.read_package().unwrap();
    assert_eq!(package, sample_package(1000));

    let text = std::fs::read_to_string(dir.path().join("timerelease.json")).unwrap();
    assert!(text.contains("\"iterations\": 1000"));
}

#[test]
fn test_write_is_create_once() {
    let dir = TempDir::new().unwrap();
    let storage = Storage::new(Config::new(dir.path().to_path_buf())).unwrap();

    storage.write_package(&sample_package(1000)).unwrap();
    let err = storage.write_package(&sample_package(2000)).unwrap_err();
    match err.downcast_ref::<StorageError>() {
        Some(StorageError::AlreadyExists(path)) => {
            assert_eq!(path, &dir.path().join("timerelease.json"))
        }
        other => panic!("expected AlreadyExists, got {:?}", other),
    }

    assert_eq!(storage.read_package().unwrap().iterations, 1000);
}

#[test]
fn test_no_temporary_files_left_behind() {
    let dir = TempDir::new().unwrap();
    let storage = Storage::new(Config::new(dir.path().to_path_buf())).unwrap();
    storage.write_package(&sample_package(42)).unwrap();
    let _ = storage.write_package(&sample_package(43));

    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("timerelease.json")]);
}

#[test]
fn test_read_missing_package() {
    let dir = TempDir::new().unwrap();
    let storage = Storage::new(Config::new(dir.path().to_path_buf())).unwrap();

    let err = storage.read_package().unwrap_err();
    match err.downcast_ref::<StorageError>() {
        Some(StorageError::NotFound(path)) => {
            assert_eq!(path, &dir.path().join("timerelease.json"))
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_read_rejects_hand_edited_package() {
    let dir = TempDir::new().unwrap();
    let storage = Storage::new(Config::new(dir.path().to_path_buf())).unwrap();
    storage.write_package(&sample_package(1000)).unwrap();

    let path = dir.path().join("timerelease.json");
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, text.replace("\"iterations\": 1000", "\"iterations\": 0")).unwrap();

    let err = storage.read_package().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StorageError>(),
        Some(StorageError::Types(_))
    ));
}

#[test]
fn test_creates_missing_directories() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");
    let config = Config::with_file_name(nested.clone(), "letter.json").unwrap();
    let storage = Storage::new(config).unwrap();

    storage.write_package(&sample_package(5)).unwrap();
    assert!(nested.join("letter.json").is_file());
    assert_eq!(storage.config().package_path, nested.join("letter.json"));
}
