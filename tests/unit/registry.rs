//! Datasource registry behaviour.

use nxsds_cli::models::DataSourceRecord;
use nxsds_cli::resolver::DataSourceRegistry;

#[test]
fn first_claimed_name_is_returned() {
    let mut registry = DataSourceRegistry::new();
    let records = [
        DataSourceRecord::default(),
        DataSourceRecord::new(None::<String>, Some("CLIENT"), Some("r1")),
        DataSourceRecord::new(Some("named"), Some("CLIENT"), Some("r2")),
    ];

    let claimed = registry.append(&records, Some("STEP"), Some("NX_INT"), None);
    assert_eq!(claimed.as_deref(), Some("__unnamed__1"));
    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["__unnamed__1", "named"]);
    assert_eq!(registry.occurrences(), 2);
}

#[test]
fn unresolved_reference_keeps_sentinel() {
    let mut registry = DataSourceRegistry::new();
    registry.append(&[DataSourceRecord::unresolved("nope")], Some("INIT"), None, None);

    let record = &registry.get("nope").unwrap()[0];
    assert!(record.source().is_unresolved());
    assert_eq!(record.kind(), Some("__ERROR__"));
    assert_eq!(record.record(), Some("__ERROR__"));
}
