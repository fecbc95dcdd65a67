#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use apidocgen::annotations::AnnotationSource;
use apidocgen::metadata::MetadataSource;
use std::path::PathBuf;

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn petstore_annotations() -> AnnotationSource {
    AnnotationSource::from_path(&fixture_path("petstore.xml")).expect("read petstore.xml")
}

pub fn petstore_metadata() -> MetadataSource {
    MetadataSource::from_path(&fixture_path("petstore.types.yml")).expect("read petstore.types.yml")
}

/// Wrap `<member>` elements in a documentation file
pub fn doc(assembly: &str, members: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n<doc><assembly><name>{assembly}</name></assembly><members>{members}</members></doc>"
    )
}
