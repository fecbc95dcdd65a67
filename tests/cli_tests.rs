#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{doc, fixture_path};
use std::fs;
use std::process::Command;

fn apidocgen() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_apidocgen"));
    command.env("APIDOCGEN_PARALLEL", "false");
    command
}

#[test]
fn test_cli_generate_writes_document() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("openapi");

    let status = apidocgen()
        .arg("generate")
        .arg("--annotation-xml")
        .arg(fixture_path("petstore.xml"))
        .arg("--type-metadata")
        .arg(fixture_path("petstore.types.yml"))
        .arg("--output")
        .arg(&out)
        .status()
        .expect("run cli");

    assert!(status.success());
    let written = out.join("Contoso.Pets.yml");
    assert!(written.exists());
    let yaml = fs::read_to_string(&written).unwrap();
    assert!(yaml.contains("openapi: 3.1.0"));
    assert!(yaml.contains("operationId: PetsController_GetPet"));

    let status = apidocgen()
        .arg("check")
        .arg("--spec")
        .arg(&written)
        .arg("--fail-on-error")
        .status()
        .expect("run cli");
    assert!(status.success());
}

#[test]
fn test_cli_generate_json_per_version() {
    let dir = tempfile::tempdir().unwrap();

    let status = apidocgen()
        .arg("generate")
        .arg("-a")
        .arg(fixture_path("petstore.xml"))
        .arg("-t")
        .arg(fixture_path("petstore.types.yml"))
        .arg("-o")
        .arg(dir.path())
        .arg("--format")
        .arg("json")
        .arg("--grouping")
        .arg("path-version")
        .arg("--document-version")
        .arg("2024-01")
        .status()
        .expect("run cli");

    assert!(status.success());
    let v1 = fs::read_to_string(dir.path().join("Contoso.Pets-v1.json")).unwrap();
    let v1: serde_json::Value = serde_json::from_str(&v1).unwrap();
    assert_eq!(v1["info"]["version"], "2024-01");
    assert!(v1["paths"].get("/v2/owners/{name}").is_none());
    assert!(dir.path().join("Contoso.Pets-v2.json").exists());
}

#[test]
fn test_cli_strict_failure_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let xml = dir.path().join("toys.xml");
    fs::write(
        &xml,
        doc(
            "Contoso.Toys",
            r#"<member name="M:Contoso.Toys.ToysController.GetToy">
                 <url>/toys</url>
                 <verb>GET</verb>
                 <response code="200" cref="T:Contoso.Toys.Toy">The toy</response>
               </member>"#,
        ),
    )
    .unwrap();
    let out = dir.path().join("out");

    let status = apidocgen()
        .arg("generate")
        .arg("-a")
        .arg(&xml)
        .arg("-t")
        .arg(fixture_path("petstore.types.yml"))
        .arg("-o")
        .arg(&out)
        .status()
        .expect("run cli");

    assert!(!status.success());
    assert!(!out.exists());
}

#[test]
fn test_cli_check_fails_on_dangling_reference() {
    let dir = tempfile::tempdir().unwrap();
    let spec = dir.path().join("broken.yaml");
    fs::write(
        &spec,
        r##"openapi: 3.1.0
info:
  title: Broken
  version: V1
paths:
  /pets:
    get:
      operationId: ListPets
      responses:
        "200":
          description: Pets
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/Pet"
"##,
    )
    .unwrap();

    let lenient = apidocgen()
        .arg("check")
        .arg("--spec")
        .arg(&spec)
        .status()
        .expect("run cli");
    assert!(lenient.success());

    let strict = apidocgen()
        .arg("check")
        .arg("--spec")
        .arg(&spec)
        .arg("--fail-on-error")
        .status()
        .expect("run cli");
    assert!(!strict.success());
}
