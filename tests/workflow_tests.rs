//! End-to-end authoring workflow: create a package, add a resource, ingest
//! batches, merge, and read the canonical data back

use anyhow::Result;
use polars::prelude::*;
use sprout_sdk::paths::PackagePath;
use sprout_sdk::properties::{
    FieldProperties, FieldType, LicenseProperties, PackageProperties, ResourceProperties,
    TableSchemaProperties,
};
use sprout_sdk::{
    create_package, create_resource, merge_resource, read_package_properties,
    update_package_properties, write_batch, PackageError,
};
use tempfile::TempDir;

fn package_properties() -> PackageProperties {
    let mut properties = PackageProperties::new("heart-study");
    properties.title = Some("Heart study".to_string());
    properties.description = Some("Data from the heart study".to_string());
    properties.licenses = vec![LicenseProperties {
        name: Some("odc-pddl".to_string()),
        ..Default::default()
    }];
    properties
}

fn patients_resource() -> ResourceProperties {
    let mut resource = ResourceProperties::new("patients");
    resource.title = Some("Patients".to_string());
    resource.description = Some("One row per patient".to_string());
    resource.schema = Some(TableSchemaProperties {
        fields: vec![
            FieldProperties::new("id", FieldType::Integer),
            FieldProperties::new("admitted", FieldType::Date),
        ],
        primary_key: Some("id".into()),
        ..Default::default()
    });
    resource
}

#[test]
fn full_lifecycle_from_creation_to_merged_data() -> Result<()> {
    let temp = TempDir::new()?;
    let paths = PackagePath::new(temp.path());

    let package_id = create_package(&paths, package_properties())?;
    assert_eq!(package_id, 1);
    assert!(paths.readme(package_id).is_file());

    let resource_id = create_resource(&paths, package_id, patients_resource())?;
    assert_eq!(resource_id, 1);

    // the manifest now carries the resource with its canonical path
    let manifest = read_package_properties(&paths.properties(package_id))?;
    assert_eq!(manifest.resources.len(), 1);
    assert_eq!(
        manifest.resources[0].path.as_deref(),
        Some("resources/1/data.parquet")
    );

    // ingest two batches; the second corrects patient 2 and adds patient 3
    let mut first = df!(
        "id" => [1i64, 2],
        "admitted" => ["2024-05-01", "2024-05-02"]
    )?;
    let mut second = df!(
        "id" => [2i64, 3],
        "admitted" => ["2024-05-09", "2024-05-10"]
    )?;
    write_batch(&paths, package_id, resource_id, &mut first)?;
    // batch timestamps have second precision; make sure the second batch
    // lands in a later second
    std::thread::sleep(std::time::Duration::from_millis(1100));
    write_batch(&paths, package_id, resource_id, &mut second)?;

    let merged = merge_resource(&paths, package_id, resource_id)?;
    assert_eq!(merged.height(), 3);
    assert!(paths.resource_data(package_id, resource_id).is_file());

    // patient 2 shows the newest batch's value
    let expected = df!(
        "id" => [1i64, 2, 3],
        "admitted" => ["2024-05-01", "2024-05-09", "2024-05-10"]
    )?;
    let sorted = merged.sort(["id"], Default::default())?;
    assert!(sorted.equals(&expected));
    Ok(())
}

#[test]
fn resource_ids_and_package_ids_are_assigned_independently() {
    let temp = TempDir::new().unwrap();
    let paths = PackagePath::new(temp.path());

    let first_package = create_package(&paths, package_properties()).unwrap();
    let second_package = create_package(&paths, package_properties()).unwrap();
    assert_eq!((first_package, second_package), (1, 2));

    let a = create_resource(&paths, second_package, patients_resource()).unwrap();
    let b = create_resource(&paths, second_package, patients_resource()).unwrap();
    assert_eq!((a, b), (1, 2));
    assert_eq!(
        read_package_properties(&paths.properties(second_package))
            .unwrap()
            .resources[1]
            .path
            .as_deref(),
        Some("resources/2/data.parquet")
    );
}

#[test]
fn envelope_updates_preserve_resources() {
    let temp = TempDir::new().unwrap();
    let paths = PackagePath::new(temp.path());

    let package_id = create_package(&paths, package_properties()).unwrap();
    create_resource(&paths, package_id, patients_resource()).unwrap();

    let mut updates = package_properties();
    updates.title = Some("Heart study, renamed".to_string());
    let updated = update_package_properties(&paths, package_id, updates).unwrap();
    assert_eq!(updated.resources.len(), 1);

    let back = read_package_properties(&paths.properties(package_id)).unwrap();
    assert_eq!(back.title.as_deref(), Some("Heart study, renamed"));
    assert_eq!(back.resources.len(), 1);
}

#[test]
fn merging_an_unknown_resource_fails() {
    let temp = TempDir::new().unwrap();
    let paths = PackagePath::new(temp.path());
    let package_id = create_package(&paths, package_properties()).unwrap();

    let result = merge_resource(&paths, package_id, 9);
    assert!(matches!(
        result,
        Err(PackageError::UnknownResource {
            resource_id: 9,
            ..
        })
    ));
}
