//! Screen file to rendered rows, through a stored preference.

use std::fs;

use gridview_cli::render::{cell_text, rows_table};
use gridview_cli::screen::{RowFormat, Screen, load_rows};
use gridview_core::{apply_view, project_rows, to_query_pairs};
use gridview_sync::{FilePreferenceBackend, Hydration, PreferenceSync, SyncConfig};
use tempfile::tempdir;

const SCREEN: &str = r#"{
    "resource": "clients",
    "fields": [
        {"name": "description", "label": "Description", "type": "string", "operators": ["contains", "="]},
        {"name": "balance", "label": "Balance", "type": "number", "operators": ["=", ">", "<"]},
        {"name": "status", "label": "Status", "type": "string", "operators": ["="]}
    ],
    "defaults": {
        "columnsOrder": ["description", "balance", "status"],
        "sortBy": "description"
    }
}"#;

const ROWS: &str = "description,balance,status\n\
                    Acme,100.00,open\n\
                    Borealis,20.50,closed\n\
                    Cobalt,,open\n\
                    acme labs,75,open\n";

#[tokio::test]
async fn stored_view_filters_and_sorts_rows() {
    let dir = tempdir().unwrap();
    let screen_path = dir.path().join("clients.json");
    let rows_path = dir.path().join("clients.csv");
    fs::write(&screen_path, SCREEN).unwrap();
    fs::write(&rows_path, ROWS).unwrap();
    let store_dir = dir.path().join("preferences");

    let screen = Screen::load(&screen_path).unwrap();
    let rows = load_rows(&rows_path, RowFormat::from_path(&rows_path)).unwrap();
    assert_eq!(rows.len(), 4);

    // First session: sort by balance descending, filter status = open,
    // hide the status column.
    let sync = PreferenceSync::new(FilePreferenceBackend::new(&store_dir), SyncConfig::default());
    let mut view = sync.open(
        screen.resource.clone(),
        screen.defaults.clone(),
        screen.fields.clone(),
    );
    assert_eq!(view.load().await, Hydration::Defaults);
    let root = view.state().filters_tree.id.clone();
    assert!(view.add_leaf(root.as_str(), "status"));
    let leaf = view.state().filters_tree.children[0].id().clone();
    assert!(view.set_leaf_value(
        leaf.as_str(),
        gridview_model::FilterValue::Text("open".to_string())
    ));
    view.toggle_sort("balance");
    view.toggle_sort("balance");
    view.set_column_visible("status", false);
    view.flush().await.unwrap();
    view.close();

    // Second session picks the view up from disk.
    let sync = PreferenceSync::new(FilePreferenceBackend::new(&store_dir), SyncConfig::default());
    let mut view = sync.open(
        screen.resource.clone(),
        screen.defaults.clone(),
        screen.fields.clone(),
    );
    assert_eq!(view.load().await, Hydration::Stored);

    let shown = apply_view(view.state(), &rows, &screen.fields);
    let projected: Vec<Vec<String>> = project_rows(view.state(), &shown)
        .iter()
        .map(|row| row.iter().map(|value| cell_text(Some(value))).collect())
        .collect();
    insta::assert_json_snapshot!(projected, @r#"
    [
      [
        "Acme",
        "100.00"
      ],
      [
        "acme labs",
        "75"
      ],
      [
        "Cobalt",
        ""
      ]
    ]
    "#);

    let rendered = rows_table(view.state(), &shown, &screen.fields).to_string();
    assert!(rendered.contains("Balance ▼"));
    assert!(!rendered.contains("Borealis"));

    let query = to_query_pairs(view.state());
    assert!(query.contains(&("sortBy".to_string(), "balance".to_string())));
    assert!(query.contains(&("sortDir".to_string(), "desc".to_string())));
    assert!(query.iter().any(|(key, value)| key == "filters" && value.contains("\"open\"")));
}
