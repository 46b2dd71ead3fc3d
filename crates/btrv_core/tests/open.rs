//! Loading from disk and template fallback.

use btrv_core::{BtrieveError, BtrieveFile, LoadOptions};
use btrv_storage::InMemoryBackend;
use btrv_testkit::prelude::*;

#[test]
fn opens_file_from_disk() {
    let fixture = TempFixture::new("USERS.DAT", &user_table(FileVersion::V5).build());
    let file = BtrieveFile::open(fixture.path(), &LoadOptions::default()).unwrap();
    assert_eq!(file.path(), Some(fixture.path()));
    assert_eq!(file.records().len(), USER_ROWS.len());
}

#[test]
fn loads_from_backend() {
    let backend = InMemoryBackend::with_data(user_table(FileVersion::V6).build());
    let file = BtrieveFile::from_backend(&backend, &LoadOptions::default()).unwrap();
    assert!(file.path().is_none());
    assert_eq!(file.data(), backend.data());
}

#[test]
fn missing_file_is_reported() {
    let fixture = TempFixture::new("OTHER.DAT", b"");
    let missing = fixture.sibling("USERS.DAT");
    let err = BtrieveFile::open(&missing, &LoadOptions::default()).unwrap_err();
    match err {
        BtrieveError::MissingFile { path } => assert_eq!(path, missing),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn template_fallback_copies_template() {
    let fixture = TempFixture::new("USERS.VIR", &user_table(FileVersion::V5).build());
    let target = fixture.sibling("USERS.DAT");

    let options = LoadOptions::new().template_fallback(true);
    let file = BtrieveFile::open(&target, &options).unwrap();
    assert!(target.exists());
    assert_eq!(file.records().len(), USER_ROWS.len());
    assert_eq!(std::fs::read(&target).unwrap(), std::fs::read(fixture.path()).unwrap());
}

#[test]
fn template_is_ignored_when_disabled() {
    let fixture = TempFixture::new("USERS.VIR", &user_table(FileVersion::V5).build());
    let target = fixture.sibling("USERS.DAT");
    let err = BtrieveFile::open(&target, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, BtrieveError::MissingFile { .. }));
    assert!(!target.exists());
}

#[test]
fn template_extension_is_configurable() {
    let fixture = TempFixture::new("USERS.TPL", &user_table(FileVersion::V6).build());
    let target = fixture.sibling("USERS.DAT");

    let options = LoadOptions::new().template_fallback(true);
    assert!(BtrieveFile::open(&target, &options).is_err());

    let options = options.template_extension("TPL");
    assert!(BtrieveFile::open(&target, &options).is_ok());
}

#[test]
fn loaded_file_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<BtrieveFile>();
}
